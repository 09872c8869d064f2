//! Stablecoin program registration and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use domain::{PixKey, RegisterProgram, StablecoinProgram, WalletAddress};
use event_log::EventLog;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::{AppState, authenticate, parse_aggregate_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProgramRequest {
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    pub client_wallet: String,
    pub payout_pix_key: String,
    pub webhook_url: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProgramCreatedResponse {
    pub program_id: String,
    pub symbol: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct ProgramResponse {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    pub status: String,
    pub client_wallet: String,
    pub payout_pix_key: String,
    pub webhook_url: String,
    pub contract_address: Option<String>,
}

fn program_response(id: &str, program: &StablecoinProgram) -> ProgramResponse {
    ProgramResponse {
        id: id.to_string(),
        symbol: program.symbol().to_string(),
        name: program.name().to_string(),
        decimals: program.decimals(),
        status: program.status().to_string(),
        client_wallet: program
            .client_wallet()
            .map(|w| w.as_str().to_string())
            .unwrap_or_default(),
        payout_pix_key: program
            .payout_pix_key()
            .map(|k| k.as_str().to_string())
            .unwrap_or_default(),
        webhook_url: program.webhook_url().to_string(),
        contract_address: program.contract_address().map(|a| a.as_str().to_string()),
    }
}

// -- Handlers --

/// POST /programs — register a new stablecoin program.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: EventLog + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CreateProgramRequest>,
) -> Result<(axum::http::StatusCode, Json<ProgramCreatedResponse>), ApiError> {
    let client_id = authenticate(&state, &headers).await?;

    let cmd = RegisterProgram::new(
        client_id,
        req.symbol,
        req.name,
        req.decimals,
        WalletAddress::new(req.client_wallet),
        PixKey::new(req.payout_pix_key),
        req.webhook_url,
    );
    let program_id = cmd.program_id;
    let result = state.orchestrator.register_program(cmd).await?;

    let response = ProgramCreatedResponse {
        program_id: program_id.to_string(),
        symbol: result.aggregate.symbol().to_string(),
        status: result.aggregate.status().to_string(),
    };

    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

/// GET /programs/:id — load a program by ID.
#[tracing::instrument(skip(state, headers))]
pub async fn get<S: EventLog + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ProgramResponse>, ApiError> {
    let client_id = authenticate(&state, &headers).await?;
    let program_id = parse_aggregate_id(&id)?;

    let program = state
        .orchestrator
        .programs()
        .get_program(program_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Program {id} not found")))?;

    if program.client_id() != Some(client_id) {
        return Err(ApiError::NotFound(format!("Program {id} not found")));
    }

    Ok(Json(program_response(&id, &program)))
}

/// GET /programs — list programs owned by the caller, from the projection.
#[tracing::instrument(skip(state, headers))]
pub async fn list<S: EventLog + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProgramResponse>>, ApiError> {
    let client_id = authenticate(&state, &headers).await?;

    // Run catch-up to ensure the read model includes latest events
    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let programs = state.programs_view.get_programs_by_client(client_id).await;

    let responses: Vec<ProgramResponse> = programs
        .into_iter()
        .map(|p| ProgramResponse {
            id: p.program_id.to_string(),
            symbol: p.symbol,
            name: p.name,
            decimals: p.decimals,
            status: p.status.to_string(),
            client_wallet: p.client_wallet.as_str().to_string(),
            payout_pix_key: p.payout_pix_key.as_str().to_string(),
            webhook_url: p.webhook_url,
            contract_address: p.contract_address.map(|a| a.as_str().to_string()),
        })
        .collect();

    Ok(Json(responses))
}
