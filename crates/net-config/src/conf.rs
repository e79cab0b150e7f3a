//! Service configuration loader
//!
//! Flat `KEY=value` file supplying the address-pool table, the node
//! identifier and the list of interfaces to manage.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};

use stornet_core::error::ConfigError;
use stornet_core::Result;

const KEY_NETWORKS: &str = "IFACE_NETWORKS";
const KEY_NODE_ID: &str = "NODE_ID";
const KEY_IFACES: &str = "IFACES";

/// Settings the reconciler reads from the service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConf {
    /// Comma-separated `name=prefix` address-pool table.
    pub iface_networks: String,
    /// Opaque per-node identifier appended to the pool prefix.
    pub node_id: String,
    /// Comma-separated list of interfaces to manage.
    pub ifaces: String,
}

impl ServiceConf {
    pub fn new(
        iface_networks: impl Into<String>,
        node_id: impl Into<String>,
        ifaces: impl Into<String>,
    ) -> Self {
        Self {
            iface_networks: iface_networks.into(),
            node_id: node_id.into(),
            ifaces: ifaces.into(),
        }
    }

    /// Load from a `KEY=value` file; `#` comments and blank lines are
    /// ignored, a missing required key is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("reading the service configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse `KEY=value` content.
    pub fn parse(content: &str) -> Result<Self> {
        let mut values: HashMap<&str, &str> = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => {
                    values.insert(key.trim(), value.trim());
                }
                None => warn!("ignoring malformed configuration line {:?}", line),
            }
        }

        let required = |key: &str| -> Result<String> {
            values
                .get(key)
                .map(|v| v.to_string())
                .ok_or_else(|| ConfigError::MissingKey { key: key.to_string() }.into())
        };

        Ok(Self {
            iface_networks: required(KEY_NETWORKS)?,
            node_id: required(KEY_NODE_ID)?,
            ifaces: required(KEY_IFACES)?,
        })
    }

    /// The managed interface names, in caller order, blank entries
    /// skipped.
    pub fn iface_list(&self) -> Vec<&str> {
        self.ifaces.split(',').filter(|s| !s.is_empty()).collect()
    }
}
