//! Transactional file installer
//!
//! Wraps the external `txn` utility: every file is installed under a
//! named transaction module, and all files for a module can be rolled
//! back in one call. The reconciler only ever installs; rollback is a
//! lifecycle/teardown concern for outer callers.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;
use tokio::time::timeout;

use stornet_core::error::SystemError;
use stornet_core::Result;

const TXN_MODULE_ENV: &str = "TXN_INSTALL_MODULE";

/// Transactional file installation, as seen by the reconciler.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileInstaller: Send + Sync {
    /// Atomically install `source` at `dest` with the given ownership
    /// and mode, recorded under this installer's transaction module.
    async fn install(
        &self,
        owner: &str,
        group: &str,
        mode: &str,
        source: &Path,
        dest: &Path,
    ) -> Result<()>;
}

/// Installer backed by the `txn` binary.
pub struct TxnInstaller {
    module: String,
    txn_path: String,
    operation_timeout: Duration,
}

impl TxnInstaller {
    /// Create an installer recording files under `module`.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            txn_path: "txn".to_string(),
            operation_timeout: Duration::from_secs(60),
        }
    }

    /// The transaction module name files are recorded under.
    pub fn module(&self) -> &str {
        &self.module
    }

    async fn run_txn(&self, args: &[&str]) -> Result<std::process::Output> {
        let mut cmd = Command::new(&self.txn_path);
        cmd.env(TXN_MODULE_ENV, &self.module)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!("executing txn {:?}", args);

        match timeout(self.operation_timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => {
                warn!("txn failed to execute: {}", e);
                Err(SystemError::CommandFailed {
                    command: format!("txn {}", args.join(" ")),
                }
                .into())
            }
            Err(_) => Err(SystemError::CommandFailed {
                command: format!("txn {} (timeout)", args.join(" ")),
            }
            .into()),
        }
    }

    /// Transaction modules known to the system.
    pub async fn list_modules(&self) -> Result<Vec<String>> {
        let output = self.run_txn(&["list-modules"]).await?;
        if !output.status.success() {
            return Err(SystemError::CommandFailed {
                command: "txn list-modules".to_string(),
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    /// Roll back every file installed under this module, if the module
    /// has recorded any. Best effort; a rollback failure is logged.
    pub async fn rollback_if_needed(&self) -> Result<()> {
        let modules = self.list_modules().await?;
        if !modules.iter().any(|m| m == &self.module) {
            debug!("no {} transaction module, nothing to roll back", self.module);
            return Ok(());
        }
        let output = self.run_txn(&["rollback", &self.module]).await?;
        if !output.status.success() {
            warn!(
                "txn rollback {} failed: {}",
                self.module,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

#[async_trait]
impl FileInstaller for TxnInstaller {
    async fn install(
        &self,
        owner: &str,
        group: &str,
        mode: &str,
        source: &Path,
        dest: &Path,
    ) -> Result<()> {
        let source_str = source.to_string_lossy();
        let dest_str = dest.to_string_lossy();
        let output = self
            .run_txn(&[
                "install", "-o", owner, "-g", group, "-m", mode, "--", &source_str, &dest_str,
            ])
            .await?;
        if !output.status.success() {
            warn!(
                "txn install {} failed: {}",
                dest_str,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(SystemError::InstallFailed {
                path: dest_str.to_string(),
            }
            .into());
        }
        debug!("installed {} at {}", source_str, dest_str);
        Ok(())
    }
}
