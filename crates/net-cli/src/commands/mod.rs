//! CLI commands

pub mod apply;
pub mod validate;

pub use apply::ApplyCommand;
pub use validate::ValidateCommand;
