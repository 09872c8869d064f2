//! Append-only event log for the stablemint backend.
//!
//! The log is the single source of truth for operation and program
//! state: aggregates are folds over their event sequence, and the
//! `expected_version` check on append is the compare-and-transition
//! primitive every state change goes through.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::AggregateId;
pub use error::{EventLogError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventLog;
pub use postgres::PostgresEventLog;
pub use query::EventQuery;
pub use store::{AppendOptions, EventLog, EventStream};
