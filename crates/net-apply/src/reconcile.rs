//! Reconciliation driver
//!
//! Reads the interfaces file, merges the desired state for every
//! requested interface, and when anything changed: brings the changed
//! interfaces down (children before parents), installs the rewritten
//! file through the transactional installer, and brings them back up
//! (parents before children). Every requested interface is brought up
//! at the end regardless of whether it changed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use stornet_config::{AddressResolver, InterfacesParser, Merger, ServiceConf};
use stornet_core::error::SystemError;
use stornet_core::{ParsedFile, Result};

use crate::ifupdown::InterfaceControl;
use crate::txn::FileInstaller;

const INTERFACES_PATH: &str = "/etc/network/interfaces";

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    /// Whether the interfaces file was rewritten
    pub changed: bool,
    /// Interfaces whose stanza was rewritten, sorted
    pub changed_interfaces: Vec<String>,
    /// Interfaces that were requested, in caller order
    pub requested: Vec<String>,
}

/// Drives one reconciliation pass. Runs must not overlap on the same
/// file; the caller serializes invocations.
pub struct Reconciler {
    parser: InterfacesParser,
    resolver: AddressResolver,
    control: Arc<dyn InterfaceControl>,
    installer: Arc<dyn FileInstaller>,
    interfaces_path: PathBuf,
}

impl Reconciler {
    pub fn new(
        conf: &ServiceConf,
        control: Arc<dyn InterfaceControl>,
        installer: Arc<dyn FileInstaller>,
    ) -> Self {
        Self {
            parser: InterfacesParser::new(),
            resolver: AddressResolver::from_table(&conf.iface_networks, conf.node_id.clone()),
            control,
            installer,
            interfaces_path: PathBuf::from(INTERFACES_PATH),
        }
    }

    /// Override the interfaces file location.
    pub fn with_interfaces_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.interfaces_path = path.into();
        self
    }

    pub fn interfaces_path(&self) -> &Path {
        &self.interfaces_path
    }

    /// Merge the requested interfaces without touching the system.
    ///
    /// Same parse-and-merge pass as `run`, reporting what would change.
    pub async fn dry_run(&self, requested: &str) -> Result<ReconcileReport> {
        let (file, names) = self.merge_requested(requested).await?;
        Ok(Self::report(&file, &names))
    }

    /// Full reconciliation pass.
    pub async fn run(&self, requested: &str) -> Result<ReconcileReport> {
        let (file, names) = self.merge_requested(requested).await?;

        if file.changed {
            let changed: Vec<String> = file.changed_interfaces.iter().cloned().collect();

            // Children go down before their parents.
            info!("bringing the changed interfaces down: {:?}", changed);
            for name in changed.iter().rev() {
                self.bring_down_best_effort(name).await;
            }

            self.install(&file).await?;

            // Parents come up before their children.
            info!("bringing the changed interfaces up: {:?}", changed);
            for name in &changed {
                self.bring_up_best_effort(name).await;
            }
        } else {
            debug!(
                "no change, not rewriting {}",
                self.interfaces_path.display()
            );
        }

        // Mandatory pass: every requested interface comes up, changed or
        // not, and a failure here is fatal.
        let mut handled = HashSet::new();
        for name in &names {
            if !handled.insert(name.clone()) {
                continue;
            }
            debug!("bringing interface {} up", name);
            let result = self.control.bring_up(name).await?;
            if !result.success {
                return Err(SystemError::InterfaceOperation {
                    interface: name.clone(),
                }
                .into());
            }
        }

        Ok(Self::report(&file, &names))
    }

    async fn merge_requested(&self, requested: &str) -> Result<(ParsedFile, Vec<String>)> {
        debug!("parsing {}", self.interfaces_path.display());
        let content = tokio::fs::read_to_string(&self.interfaces_path).await?;
        let mut file = self.parser.parse(&content)?;

        let merger = Merger::new(&self.resolver);
        let names: Vec<String> = requested
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        for name in &names {
            merger.ensure(&mut file, name)?;
        }
        Ok((file, names))
    }

    async fn install(&self, file: &ParsedFile) -> Result<()> {
        let content = self.parser.render(file);
        let staged = tempfile::NamedTempFile::new()?;
        tokio::fs::write(staged.path(), content).await?;
        debug!(
            "staged the new interface definitions at {}",
            staged.path().display()
        );
        self.installer
            .install("root", "root", "644", staged.path(), &self.interfaces_path)
            .await
    }

    async fn bring_down_best_effort(&self, name: &str) {
        match self.control.bring_down(name).await {
            Ok(result) if result.success => {}
            Ok(result) => warn!(
                "could not bring {} down: {}",
                name,
                result.stderr.trim()
            ),
            Err(err) => warn!("could not bring {} down: {}", name, err),
        }
    }

    async fn bring_up_best_effort(&self, name: &str) {
        match self.control.bring_up(name).await {
            Ok(result) if result.success => {}
            Ok(result) => warn!("could not bring {} up: {}", name, result.stderr.trim()),
            Err(err) => warn!("could not bring {} up: {}", name, err),
        }
    }

    fn report(file: &ParsedFile, names: &[String]) -> ReconcileReport {
        ReconcileReport {
            changed: file.changed,
            changed_interfaces: file.changed_interfaces.iter().cloned().collect(),
            requested: names.to_vec(),
        }
    }
}
