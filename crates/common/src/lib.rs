//! Shared identifier types used across the stablemint workspace.

pub mod types;

pub use types::{AggregateId, ParseIdError};
