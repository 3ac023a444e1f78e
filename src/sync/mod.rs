//! Roster synchronization and the periodic reconciliation pipeline

pub mod reconcile;
pub mod roster;

pub use reconcile::{run_reconciliation, ReconcileSummary};
pub use roster::sync_roster;
