//! StorNet Config
//!
//! Interfaces-file parsing, desired-state merging and generation

pub mod conf;
pub mod interfaces;
pub mod merge;
pub mod overlay;
pub mod resolver;

pub use conf::ServiceConf;
pub use interfaces::{render_iface_stanza, InterfacesParser};
pub use merge::Merger;
pub use overlay::{build_overlay, parent_of};
pub use resolver::AddressResolver;
