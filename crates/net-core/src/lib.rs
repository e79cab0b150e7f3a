//! StorNet Core
//!
//! Shared types and error taxonomy for the interfaces-file reconciler

pub mod error;
pub mod types;

pub use error::{ConfigError, NetError, SystemError};
pub use types::*;

/// Result type for reconciler operations
pub type Result<T> = std::result::Result<T, NetError>;
