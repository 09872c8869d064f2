//! Read model views for the query side.

pub mod operations;
pub mod programs;
pub mod reconciliation;

pub use operations::{OperationSummary, OperationsView};
pub use programs::{ProgramSummary, ProgramsView};
pub use reconciliation::{ReconciliationEntry, ReconciliationView};
