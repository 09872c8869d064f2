use thiserror::Error;

use crate::{AggregateId, Version};

/// Errors that can occur when interacting with the event log.
#[derive(Debug, Error)]
pub enum EventLogError {
    /// The expected version did not match the stored version at append
    /// time. This is the stale-state signal the sagas rely on: of two
    /// racing writers, exactly one sees this error.
    #[error(
        "concurrency conflict for aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    /// The aggregate has no events in the log.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(AggregateId),

    /// A batch of events failed pre-append validation.
    #[error("invalid append: {0}")]
    InvalidAppend(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event log operations.
pub type Result<T> = std::result::Result<T, EventLogError>;
