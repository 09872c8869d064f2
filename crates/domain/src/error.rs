//! Domain error types.

use event_log::EventLogError;
use thiserror::Error;

use crate::operation::OperationError;
use crate::program::ProgramError;
use crate::value_objects::AmountError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event log.
    #[error("Event log error: {0}")]
    EventLog(#[from] EventLogError),

    /// An error occurred in the operation aggregate.
    #[error("Operation error: {0}")]
    Operation(OperationError),

    /// An error occurred in the program aggregate.
    #[error("Program error: {0}")]
    Program(ProgramError),

    /// An amount failed validation.
    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    /// A program with this ticker symbol already exists.
    #[error("A program with symbol {symbol} is already registered")]
    DuplicateSymbol { symbol: String },

    /// Aggregate not found.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if this error means the caller acted on stale state:
    /// either the status check rejected the transition or a concurrent
    /// writer won the version race. Sagas treat both as "already handled".
    pub fn is_stale_state(&self) -> bool {
        matches!(
            self,
            DomainError::Operation(OperationError::InvalidStateTransition { .. })
                | DomainError::EventLog(EventLogError::ConcurrencyConflict { .. })
        )
    }
}
