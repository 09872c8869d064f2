//! Webhook signature guard.
//!
//! Every inbound provider webhook is verified against an HMAC-SHA256
//! signature over the exact raw body bytes before anything else touches
//! the request. Rejection here means no state is read or written.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::OrchestratorError;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a hex-encoded HMAC-SHA256 signature over the raw body.
///
/// Comparison is constant-time via `Mac::verify_slice`. A missing or
/// non-hex header and a mismatched digest all fail the same way.
pub fn verify_signature(
    raw_body: &[u8],
    signature_header: Option<&str>,
    secret: &str,
) -> Result<(), OrchestratorError> {
    let signature = signature_header
        .ok_or_else(|| OrchestratorError::Authentication("missing signature header".to_string()))?;

    let provided = hex::decode(signature.trim())
        .map_err(|_| OrchestratorError::Authentication("malformed signature header".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| OrchestratorError::Authentication("invalid webhook secret".to_string()))?;
    mac.update(raw_body);

    mac.verify_slice(&provided)
        .map_err(|_| OrchestratorError::Authentication("signature mismatch".to_string()))
}

/// Computes the hex signature for a body. Used by test fixtures and the
/// in-memory payment provider to produce deliverable webhooks.
pub fn sign(raw_body: &[u8], secret: &str) -> String {
    // new_from_slice only fails on zero-length output, impossible for SHA-256
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).unwrap_or_else(|_| unreachable!());
    mac.update(raw_body);
    hex::encode(mac.finalize().into_bytes())
}
