//! StorNet Apply
//!
//! External collaborators (ifup/ifdown, transactional file install) and
//! the reconciliation driver tying them to the config layer

pub mod ifupdown;
pub mod reconcile;
pub mod txn;

#[cfg(test)]
mod tests;

pub use ifupdown::{CommandResult, IfUpDown, InterfaceControl};
pub use reconcile::{ReconcileReport, Reconciler};
pub use txn::{FileInstaller, TxnInstaller};
