//! Apply command

use std::sync::Arc;

use anyhow::{Context, Result};

use stornet_apply::{IfUpDown, Reconciler, TxnInstaller};
use stornet_config::ServiceConf;

/// Transaction module name the installed file is recorded under.
const TXN_MODULE: &str = "stornet";

/// Apply command implementation
pub struct ApplyCommand {
    conf: ServiceConf,
    interfaces_path: String,
}

impl ApplyCommand {
    pub fn new(conf: ServiceConf, interfaces_path: String) -> Self {
        Self {
            conf,
            interfaces_path,
        }
    }

    /// Execute apply command
    pub async fn execute(&self, dry_run: bool, json: bool) -> Result<()> {
        let reconciler = Reconciler::new(
            &self.conf,
            Arc::new(IfUpDown::new()),
            Arc::new(TxnInstaller::new(TXN_MODULE)),
        )
        .with_interfaces_path(self.interfaces_path.clone());

        let report = if dry_run {
            println!(
                "Performing dry-run reconciliation of {}",
                self.interfaces_path
            );
            reconciler.dry_run(&self.conf.ifaces).await
        } else {
            println!("Reconciling {}", self.interfaces_path);
            reconciler.run(&self.conf.ifaces).await
        }
        .with_context(|| format!("Failed to reconcile {}", self.interfaces_path))?;

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        if report.changed {
            let verb = if dry_run { "would change" } else { "changed" };
            println!(
                "✓ {} interface(s) {}: {}",
                report.changed_interfaces.len(),
                verb,
                report.changed_interfaces.join(", ")
            );
        } else {
            println!("✓ No changes needed");
        }
        Ok(())
    }
}
