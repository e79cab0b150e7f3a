//! ifup/ifdown integration
//!
//! Runs the OS interface control commands with a timeout. A command that
//! runs and exits non-zero is reported through `CommandResult`; failing
//! to run at all is a `SystemError`. Whether a failure is fatal is the
//! caller's decision.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::timeout;

use stornet_core::error::SystemError;
use stornet_core::Result;

/// Result of one external command invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the command exited successfully
    pub success: bool,
    /// Exit code of the command
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

/// OS interface control, as seen by the reconciler.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InterfaceControl: Send + Sync {
    /// Bring `name` up. Idempotent on the OS side.
    async fn bring_up(&self, name: &str) -> Result<CommandResult>;

    /// Bring `name` down.
    async fn bring_down(&self, name: &str) -> Result<CommandResult>;
}

/// Interface control backed by the system ifup/ifdown binaries.
pub struct IfUpDown {
    ifup_path: String,
    ifdown_path: String,
    operation_timeout: Duration,
}

impl IfUpDown {
    pub fn new() -> Self {
        Self {
            ifup_path: "/sbin/ifup".to_string(),
            ifdown_path: "/sbin/ifdown".to_string(),
            operation_timeout: Duration::from_secs(60),
        }
    }

    /// Create with custom command paths and timeout.
    pub fn with_config(
        ifup_path: String,
        ifdown_path: String,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            ifup_path,
            ifdown_path,
            operation_timeout,
        }
    }

    async fn execute(&self, program: &str, name: &str, operation: &str) -> Result<CommandResult> {
        let mut cmd = Command::new(program);
        cmd.arg(name).stdout(Stdio::piped()).stderr(Stdio::piped());

        debug!("executing {}: {:?}", operation, cmd);

        match timeout(self.operation_timeout, cmd.output()).await {
            Ok(Ok(output)) => {
                let result = CommandResult {
                    success: output.status.success(),
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };
                if result.success {
                    debug!("{} completed", operation);
                } else {
                    warn!(
                        "{} failed with exit code {:?}: {}",
                        operation,
                        result.exit_code,
                        result.stderr.trim()
                    );
                }
                Ok(result)
            }
            Ok(Err(e)) => {
                error!("{} failed to execute: {}", operation, e);
                Err(SystemError::CommandFailed {
                    command: format!("{} {}", program, name),
                }
                .into())
            }
            Err(_) => {
                error!("{} timed out after {:?}", operation, self.operation_timeout);
                Err(SystemError::CommandFailed {
                    command: format!("{} {} (timeout)", program, name),
                }
                .into())
            }
        }
    }
}

#[async_trait]
impl InterfaceControl for IfUpDown {
    async fn bring_up(&self, name: &str) -> Result<CommandResult> {
        self.execute(
            &self.ifup_path,
            name,
            &format!("bring up interface {}", name),
        )
        .await
    }

    async fn bring_down(&self, name: &str) -> Result<CommandResult> {
        self.execute(
            &self.ifdown_path,
            name,
            &format!("bring down interface {}", name),
        )
        .await
    }
}

impl Default for IfUpDown {
    fn default() -> Self {
        Self::new()
    }
}
