//! Error types for reconciler operations

use thiserror::Error;

/// Main error type for reconciler operations
#[derive(Debug, Error)]
pub enum NetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("System error: {0}")]
    System(#[from] SystemError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interfaces-file parsing and merging errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unrecognized line {line} in the interfaces file: {text}")]
    UnrecognizedLine { line: usize, text: String },

    #[error("Duplicate interface definition: {name}")]
    DuplicateInterface { name: String },

    #[error("Invalid property line {line} for interface {interface}: {text}")]
    InvalidProperty {
        interface: String,
        line: usize,
        text: String,
    },

    #[error("No network defined for interface {name}")]
    UnknownInterface { name: String },

    #[error("Missing configuration key: {key}")]
    MissingKey { key: String },

    /// Internal invariant violation: an interface entry with a
    /// definition must have a matching iface block.
    #[error("Internal error: no block defines the {name} interface")]
    MissingBlock { name: String },
}

/// External collaborator errors
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Command execution failed: {command}")]
    CommandFailed { command: String },

    #[error("Network interface operation failed: {interface}")]
    InterfaceOperation { interface: String },

    #[error("Transactional install failed for {path}")]
    InstallFailed { path: String },
}
