//! Validate command

use anyhow::{Context, Result};

use stornet_config::InterfacesParser;

/// Validate command implementation
pub struct ValidateCommand {
    interfaces_path: String,
}

impl ValidateCommand {
    pub fn new(interfaces_path: String) -> Self {
        Self { interfaces_path }
    }

    /// Parse the interfaces file and report what it defines.
    pub async fn execute(&self) -> Result<()> {
        let content = tokio::fs::read_to_string(&self.interfaces_path)
            .await
            .with_context(|| format!("Failed to read {}", self.interfaces_path))?;

        let file = InterfacesParser::new()
            .parse(&content)
            .with_context(|| format!("Failed to parse {}", self.interfaces_path))?;

        println!(
            "✓ {} parses: {} block(s), {} interface(s)",
            self.interfaces_path,
            file.blocks.len(),
            file.interfaces.len()
        );
        for (name, entry) in &file.interfaces {
            let auto = if entry.auto { " (auto)" } else { "" };
            let defined = if entry.data.is_some() {
                ""
            } else {
                " (no definition)"
            };
            println!("  {}{}{}", name, auto, defined);
        }
        Ok(())
    }
}
