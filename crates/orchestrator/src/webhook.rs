//! Payment-provider webhook payloads.
//!
//! Deliveries arrive as `{"id": ..., "event": ..., "data": {...}}`. The
//! envelope is parsed first so that unknown-but-well-formed event types
//! can be acknowledged and ignored; known types then get a strict
//! per-type schema.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OrchestratorError;

/// A raw webhook delivery envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDelivery {
    /// Provider-side delivery identifier.
    pub id: String,

    /// Event type, e.g. `payment.confirmed`.
    pub event: String,

    /// Event-type-specific payload.
    pub data: Value,
}

impl RawDelivery {
    /// Parses a raw body into a delivery envelope.
    pub fn parse(raw_body: &[u8]) -> Result<Self, OrchestratorError> {
        serde_json::from_slice(raw_body)
            .map_err(|e| OrchestratorError::Authentication(format!("unparsable webhook body: {e}")))
    }
}

/// Payload of a `payment.confirmed` delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmedData {
    /// Provider-side collection identifier.
    pub id: String,

    /// Confirmed amount.
    pub value: Decimal,

    /// Provider-side status string.
    pub status: String,

    /// Our operation id, echoed back by the provider.
    pub external_reference: String,
}

/// Payload of a `payout.confirmed` delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutConfirmedData {
    /// Provider-side payout identifier.
    pub id: String,

    /// Provider-side status string.
    pub status: String,
}

/// Webhook event types the orchestrator reacts to.
pub mod events {
    /// A collection was paid by the end customer.
    pub const PAYMENT_CONFIRMED: &str = "payment.confirmed";

    /// A payout reached the destination account.
    pub const PAYOUT_CONFIRMED: &str = "payout.confirmed";
}
