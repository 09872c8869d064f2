//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, OperationError, ProgramError};
use event_log::EventLogError;
use orchestrator::OrchestratorError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid credentials.
    Unauthorized(String),
    /// Orchestrator error.
    Orchestrator(OrchestratorError),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, error_body(msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, error_body(msg)),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, error_body(msg)),
            ApiError::Orchestrator(err) => orchestrator_error_to_response(err),
            ApiError::Domain(err) => {
                let (status, msg) = domain_error_to_response(err);
                (status, error_body(msg))
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, error_body(msg))
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn error_body(message: String) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

fn orchestrator_error_to_response(err: OrchestratorError) -> (StatusCode, serde_json::Value) {
    match err {
        OrchestratorError::Authentication(msg) => (StatusCode::UNAUTHORIZED, error_body(msg)),
        OrchestratorError::NotFound(msg) => (StatusCode::NOT_FOUND, error_body(msg)),
        OrchestratorError::Conflict(msg) => (StatusCode::CONFLICT, error_body(msg)),
        OrchestratorError::ExternalBusiness(msg) => {
            (StatusCode::UNPROCESSABLE_ENTITY, error_body(msg))
        }
        OrchestratorError::ExternalTransient(msg) => (StatusCode::BAD_GATEWAY, error_body(msg)),
        OrchestratorError::LedgerFailure {
            operation_id,
            message,
        } => (
            StatusCode::BAD_GATEWAY,
            serde_json::json!({
                "error": message,
                "operation_id": operation_id.to_string(),
                "burn_occurred": false,
            }),
        ),
        // The caller must be able to tell that value already left the
        // ledger; the burn tx hash is the proof.
        OrchestratorError::PartialFailure {
            operation_id,
            burn_tx_hash,
            message,
        } => (
            StatusCode::BAD_GATEWAY,
            serde_json::json!({
                "error": message,
                "operation_id": operation_id.to_string(),
                "burn_occurred": true,
                "burn_tx_hash": burn_tx_hash,
            }),
        ),
        OrchestratorError::Domain(err) => {
            let (status, msg) = domain_error_to_response(err);
            (status, error_body(msg))
        }
        OrchestratorError::EventLog(err) => {
            tracing::error!(error = %err, "event log error");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(err.to_string()))
        }
        OrchestratorError::Serialization(err) => {
            (StatusCode::BAD_REQUEST, error_body(err.to_string()))
        }
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Operation(op_err) => match op_err {
            OperationError::InvalidStateTransition { .. } => {
                (StatusCode::CONFLICT, err.to_string())
            }
            OperationError::AlreadyCreated => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        DomainError::Program(program_err) => match program_err {
            ProgramError::InvalidSymbol { .. }
            | ProgramError::InvalidName
            | ProgramError::InvalidDecimals { .. } => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ProgramError::AlreadyRegistered | ProgramError::AlreadyDeployed => {
                (StatusCode::CONFLICT, err.to_string())
            }
        },
        DomainError::Amount(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::DuplicateSymbol { .. } => (StatusCode::CONFLICT, err.to_string()),
        DomainError::AggregateNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::EventLog(EventLogError::ConcurrencyConflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        ApiError::Orchestrator(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
