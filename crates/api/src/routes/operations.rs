//! Deposit, withdraw, and operation query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use domain::{Aggregate, Amount, OperationStatus};
use event_log::EventLog;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::{AppState, authenticate, parse_aggregate_id};

// -- Request types --

#[derive(Deserialize)]
pub struct OperationRequest {
    pub program_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct DepositCreatedResponse {
    pub operation_id: String,
    pub pay_code: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct WithdrawCreatedResponse {
    pub operation_id: String,
    pub payout_id: String,
    pub burn_tx_hash: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct OperationResponse {
    pub id: String,
    pub program_id: String,
    pub kind: String,
    pub status: String,
    pub amount: Decimal,
    pub collection_id: Option<String>,
    pub pay_code: Option<String>,
    pub payout_id: Option<String>,
    pub mint_tx_hash: Option<String>,
    pub burn_tx_hash: Option<String>,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct ReconciliationEntryResponse {
    pub operation_id: String,
    pub program_id: String,
    pub amount: Decimal,
    pub burn_tx_hash: Option<String>,
    pub error: String,
    pub failed_at: String,
}

/// Response type for event envelope data.
#[derive(Serialize)]
pub struct EventEnvelopeResponse {
    pub event_id: String,
    pub event_type: String,
    pub aggregate_id: String,
    pub version: i64,
    pub timestamp: String,
    pub payload: serde_json::Value,
}

// -- Handlers --

/// POST /deposits — request a deposit operation on a program.
#[tracing::instrument(skip(state, headers, req))]
pub async fn deposit<S: EventLog + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<OperationRequest>,
) -> Result<(axum::http::StatusCode, Json<DepositCreatedResponse>), ApiError> {
    let client_id = authenticate(&state, &headers).await?;
    let program_id = parse_aggregate_id(&req.program_id)?;
    let amount =
        Amount::new(req.amount).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let receipt = state
        .orchestrator
        .request_deposit(client_id, program_id, amount)
        .await?;

    let response = DepositCreatedResponse {
        operation_id: receipt.operation_id.to_string(),
        pay_code: receipt.pay_code,
        status: receipt.status.to_string(),
    };

    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

/// POST /withdrawals — request a withdraw operation on a program.
///
/// Runs the burn synchronously; a partial failure after the burn comes
/// back as 502 with `burn_occurred: true` and the burn tx hash.
#[tracing::instrument(skip(state, headers, req))]
pub async fn withdraw<S: EventLog + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<OperationRequest>,
) -> Result<(axum::http::StatusCode, Json<WithdrawCreatedResponse>), ApiError> {
    let client_id = authenticate(&state, &headers).await?;
    let program_id = parse_aggregate_id(&req.program_id)?;
    let amount =
        Amount::new(req.amount).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let receipt = state
        .orchestrator
        .request_withdraw(client_id, program_id, amount)
        .await?;

    let response = WithdrawCreatedResponse {
        operation_id: receipt.operation_id.to_string(),
        payout_id: receipt.payout_id,
        burn_tx_hash: receipt.burn_tx_hash.as_str().to_string(),
        status: receipt.status.to_string(),
    };

    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

/// GET /operations/:id — load an operation aggregate by ID.
#[tracing::instrument(skip(state, headers))]
pub async fn get<S: EventLog + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OperationResponse>, ApiError> {
    let client_id = authenticate(&state, &headers).await?;
    let operation_id = parse_aggregate_id(&id)?;

    let operation = state
        .orchestrator
        .operations()
        .get_operation(operation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Operation {id} not found")))?;

    if operation.client_id() != Some(client_id) {
        return Err(ApiError::NotFound(format!("Operation {id} not found")));
    }

    Ok(Json(OperationResponse {
        id: operation.id().map(|i| i.to_string()).unwrap_or_default(),
        program_id: operation
            .program_id()
            .map(|p| p.to_string())
            .unwrap_or_default(),
        kind: operation.kind().map(|k| k.to_string()).unwrap_or_default(),
        status: operation.status().to_string(),
        amount: operation
            .amount()
            .map(|a| a.as_decimal())
            .unwrap_or_default(),
        collection_id: operation.collection_id().map(String::from),
        pay_code: operation.pay_code().map(String::from),
        payout_id: operation.payout_id().map(String::from),
        mint_tx_hash: operation.mint_tx_hash().map(|h| h.as_str().to_string()),
        burn_tx_hash: operation.burn_tx_hash().map(|h| h.as_str().to_string()),
        error: operation.error_message().map(String::from),
    }))
}

/// GET /operations — list the caller's operations, optionally by status.
#[tracing::instrument(skip(state, headers))]
pub async fn list<S: EventLog + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<OperationResponse>>, ApiError> {
    let client_id = authenticate(&state, &headers).await?;

    let status = params
        .status
        .map(|s| parse_status(&s))
        .transpose()?;

    // Run catch-up to ensure the read model includes latest events
    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let operations = state
        .operations_view
        .get_operations_by_client(client_id)
        .await;

    let responses: Vec<OperationResponse> = operations
        .into_iter()
        .filter(|o| status.is_none_or(|s| o.status == s))
        .map(|o| OperationResponse {
            id: o.operation_id.to_string(),
            program_id: o.program_id.to_string(),
            kind: o.kind.to_string(),
            status: o.status.to_string(),
            amount: o.amount.as_decimal(),
            collection_id: o.collection_id,
            pay_code: o.pay_code,
            payout_id: o.payout_id,
            mint_tx_hash: o.mint_tx_hash.map(|h| h.as_str().to_string()),
            burn_tx_hash: o.burn_tx_hash.map(|h| h.as_str().to_string()),
            error: o.error,
        })
        .collect();

    Ok(Json(responses))
}

/// GET /operations/:id/events — list all events for an operation.
#[tracing::instrument(skip(state, headers))]
pub async fn events<S: EventLog + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventEnvelopeResponse>>, ApiError> {
    let client_id = authenticate(&state, &headers).await?;
    let operation_id = parse_aggregate_id(&id)?;

    let operation = state
        .orchestrator
        .operations()
        .get_operation(operation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Operation {id} not found")))?;
    if operation.client_id() != Some(client_id) {
        return Err(ApiError::NotFound(format!("Operation {id} not found")));
    }

    let envelopes = state
        .orchestrator
        .log()
        .events_for_aggregate(operation_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let responses: Vec<EventEnvelopeResponse> = envelopes
        .into_iter()
        .map(|e| EventEnvelopeResponse {
            event_id: e.event_id.to_string(),
            event_type: e.event_type,
            aggregate_id: e.aggregate_id.to_string(),
            version: e.version.as_i64(),
            timestamp: e.timestamp.to_rfc3339(),
            payload: e.payload,
        })
        .collect();

    Ok(Json(responses))
}

/// GET /reconciliation — list operations flagged for reconciliation.
#[tracing::instrument(skip(state, headers))]
pub async fn reconciliation<S: EventLog + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ReconciliationEntryResponse>>, ApiError> {
    authenticate(&state, &headers).await?;

    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let entries = state.reconciliation_view.get_flagged_operations().await;

    let responses: Vec<ReconciliationEntryResponse> = entries
        .into_iter()
        .map(|e| ReconciliationEntryResponse {
            operation_id: e.operation_id.to_string(),
            program_id: e.program_id.to_string(),
            amount: e.amount.as_decimal(),
            burn_tx_hash: e.burn_tx_hash.map(|h| h.as_str().to_string()),
            error: e.error,
            failed_at: e.failed_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(responses))
}

fn parse_status(value: &str) -> Result<OperationStatus, ApiError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| ApiError::BadRequest(format!("Unknown status: {value}")))
}
