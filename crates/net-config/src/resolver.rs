//! Address resolver
//!
//! Maps a logical interface name to its address-pool prefix and combines
//! it with the node identifier. The result is written to the interfaces
//! file as-is; no address validation is performed.

use std::collections::HashMap;

use log::{debug, warn};

use stornet_core::error::ConfigError;
use stornet_core::Result;

/// Resolver over the comma-separated `name=prefix` table.
#[derive(Debug, Clone)]
pub struct AddressResolver {
    nets: HashMap<String, String>,
    node_id: String,
}

impl AddressResolver {
    /// Build from the raw table (`eth0=10.1.1.,eth0.100=10.1.100.`) and
    /// the node identifier.
    pub fn from_table(table: &str, node_id: impl Into<String>) -> Self {
        let mut nets = HashMap::new();
        for entry in table.split(',').filter(|s| !s.is_empty()) {
            match entry.split_once('=') {
                Some((name, prefix)) => {
                    nets.insert(name.to_string(), prefix.to_string());
                }
                None => warn!("ignoring malformed network table entry {:?}", entry),
            }
        }
        Self {
            nets,
            node_id: node_id.into(),
        }
    }

    /// Full address for `name`: pool prefix + node id.
    pub fn resolve(&self, name: &str) -> Result<String> {
        let prefix = self
            .nets
            .get(name)
            .ok_or_else(|| ConfigError::UnknownInterface {
                name: name.to_string(),
            })?;
        let address = format!("{}{}", prefix, self.node_id);
        debug!("resolved {} to {}", name, address);
        Ok(address)
    }
}
