//! Desired-state overlay builder
//!
//! Computes the property set a managed interface should have. VLAN
//! sub-interfaces (`<parent>.<vlan-id>`) additionally carry the raw
//! device reference; plain interfaces carry the ethtool tuning hooks.

use stornet_core::{PropertyMap, PropertyValue, Result};

use crate::resolver::AddressResolver;

const NETMASK: &str = "255.255.255.0";
const MTU: &str = "9000";

/// Parent of a VLAN sub-interface: the part before the first `.`.
pub fn parent_of(name: &str) -> Option<&str> {
    name.split_once('.').map(|(parent, _)| parent)
}

/// Build the desired property set for `name`.
///
/// Pure function of the name and the resolver; callers merging a VLAN
/// interface must merge its parent first.
pub fn build_overlay(name: &str, resolver: &AddressResolver) -> Result<PropertyMap> {
    match parent_of(name) {
        Some(parent) => vlan_overlay(name, parent, resolver),
        None => plain_overlay(name, resolver),
    }
}

fn vlan_overlay(name: &str, parent: &str, resolver: &AddressResolver) -> Result<PropertyMap> {
    let mut data = base_overlay(name, resolver)?;
    data.insert(
        "vlan-raw-device".to_string(),
        PropertyValue::Scalar(parent.to_string()),
    );
    data.insert(
        "post-up".to_string(),
        PropertyValue::List(vec![
            "/sbin/ip link set dev ${IF_VLAN_RAW_DEVICE} mtu 9000".to_string(),
            "/sbin/ip link set dev ${IFACE} mtu 9000".to_string(),
        ]),
    );
    Ok(data)
}

fn plain_overlay(name: &str, resolver: &AddressResolver) -> Result<PropertyMap> {
    let mut data = base_overlay(name, resolver)?;
    // The ethtool hooks tolerate failure themselves via `|| true`.
    data.insert(
        "post-up".to_string(),
        PropertyValue::List(vec![
            "/sbin/ip link set dev ${IFACE} mtu 9000".to_string(),
            "/sbin/ethtool -A ${IFACE} autoneg off tx off rx on || true".to_string(),
            "/sbin/ethtool -C ${IFACE} rx-usecs 16 || true".to_string(),
            "/sbin/ethtool -G ${IFACE} rx 4096 tx 512 || true".to_string(),
        ]),
    );
    Ok(data)
}

fn base_overlay(name: &str, resolver: &AddressResolver) -> Result<PropertyMap> {
    let mut data = PropertyMap::new();
    data.insert(
        "address".to_string(),
        PropertyValue::Scalar(resolver.resolve(name)?),
    );
    data.insert(
        "netmask".to_string(),
        PropertyValue::Scalar(NETMASK.to_string()),
    );
    data.insert("mtu".to_string(), PropertyValue::Scalar(MTU.to_string()));
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> AddressResolver {
        AddressResolver::from_table("eth0=10.1.1.,eth0.100=10.1.100.", "5")
    }

    #[test]
    fn vlan_name_detection() {
        assert_eq!(parent_of("eth0.100"), Some("eth0"));
        assert_eq!(parent_of("eth0"), None);
        // Only the first dot determines the parent.
        assert_eq!(parent_of("bond0.100.200"), Some("bond0"));
    }

    #[test]
    fn plain_overlay_properties() {
        let data = build_overlay("eth0", &resolver()).unwrap();
        assert_eq!(data["address"], PropertyValue::Scalar("10.1.1.5".into()));
        assert_eq!(data["netmask"], PropertyValue::Scalar(NETMASK.into()));
        assert_eq!(data["mtu"], PropertyValue::Scalar(MTU.into()));
        assert!(!data.contains_key("vlan-raw-device"));
        match &data["post-up"] {
            PropertyValue::List(items) => assert_eq!(items.len(), 4),
            other => panic!("post-up should be a list, got {:?}", other),
        }
    }

    #[test]
    fn vlan_overlay_properties() {
        let data = build_overlay("eth0.100", &resolver()).unwrap();
        assert_eq!(data["address"], PropertyValue::Scalar("10.1.100.5".into()));
        assert_eq!(
            data["vlan-raw-device"],
            PropertyValue::Scalar("eth0".into())
        );
        match &data["post-up"] {
            PropertyValue::List(items) => {
                assert_eq!(items.len(), 2);
                assert!(items[0].contains("IF_VLAN_RAW_DEVICE"));
            }
            other => panic!("post-up should be a list, got {:?}", other),
        }
    }

    #[test]
    fn overlay_is_stable_across_calls() {
        let resolver = resolver();
        assert_eq!(
            build_overlay("eth0", &resolver).unwrap(),
            build_overlay("eth0", &resolver).unwrap()
        );
    }
}
