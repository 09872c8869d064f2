//! Orchestrator error types.

use common::AggregateId;
use domain::DomainError;
use event_log::EventLogError;
use thiserror::Error;

/// Errors that can occur while orchestrating operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Signature verification or ownership check failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A referenced program or operation does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request conflicts with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An external collaborator was unreachable or timed out.
    /// Retryable by the caller; never auto-retried after a ledger
    /// submission has been sent.
    #[error("External service unavailable: {0}")]
    ExternalTransient(String),

    /// An external collaborator rejected the request.
    #[error("External service rejected the request: {0}")]
    ExternalBusiness(String),

    /// A ledger mint or burn failed; the failure is recorded on the
    /// operation.
    #[error("Ledger failure on operation {operation_id}: {message}")]
    LedgerFailure {
        operation_id: AggregateId,
        message: String,
    },

    /// Tokens were burned but the payout was not created. The operation
    /// is parked in `BurnSucceededPayoutFailed` for reconciliation; the
    /// burn tx hash proves the burn happened.
    #[error("Burn succeeded but payout failed on operation {operation_id}: {message}")]
    PartialFailure {
        operation_id: AggregateId,
        burn_tx_hash: String,
        message: String,
    },

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Event log error.
    #[error("Event log error: {0}")]
    EventLog(#[from] EventLogError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for orchestrator results.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
