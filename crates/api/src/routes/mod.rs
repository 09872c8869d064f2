//! HTTP route handlers and shared application state.

pub mod health;
pub mod metrics;
pub mod operations;
pub mod programs;
pub mod webhooks;

use std::sync::Arc;

use axum::http::HeaderMap;
use domain::ClientId;
use event_log::EventLog;
use orchestrator::{
    InMemoryAuthProvider, InMemoryLedger, InMemoryNotifier, InMemoryPaymentProvider, Orchestrator,
};
use projections::{OperationsView, ProgramsView, ProjectionProcessor, ReconciliationView};

use crate::error::ApiError;

/// Orchestrator wired to the in-memory collaborator clients.
pub type DefaultOrchestrator<S> =
    Orchestrator<S, InMemoryLedger, InMemoryPaymentProvider, InMemoryNotifier, InMemoryAuthProvider>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventLog + Clone> {
    pub orchestrator: DefaultOrchestrator<S>,
    pub operations_view: Arc<OperationsView>,
    pub programs_view: Arc<ProgramsView>,
    pub reconciliation_view: Arc<ReconciliationView>,
    pub projection_processor: Arc<ProjectionProcessor<S>>,
}

/// Resolves the `X-Api-Key` header to a client identity.
pub(crate) async fn authenticate<S: EventLog + Clone>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<ClientId, ApiError> {
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing X-Api-Key header".to_string()))?;
    Ok(state.orchestrator.authenticate(api_key).await?)
}

pub(crate) fn parse_aggregate_id(id: &str) -> Result<common::AggregateId, ApiError> {
    common::AggregateId::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
