//! Payment-provider webhook endpoint.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use event_log::EventLog;
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::AppState;

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /webhooks/payment — accept a signed provider delivery.
///
/// The raw body bytes go to signature verification untouched; parsing
/// happens only after the signature passes. Duplicate and unmatched
/// deliveries are acknowledged with 200 so the provider stops retrying.
#[tracing::instrument(skip(state, headers, body))]
pub async fn payment<S: EventLog + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get("x-webhook-signature")
        .and_then(|v| v.to_str().ok());

    state.orchestrator.handle_webhook(&body, signature).await?;

    Ok(Json(WebhookAck { received: true }))
}
