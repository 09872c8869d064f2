//! Client notification trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error delivering a notification. Notifications are best-effort; the
/// caller logs this and moves on.
#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifierError(pub String);

/// Payload delivered to the client's webhook URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// The operation the notification is about.
    pub operation_id: AggregateId,

    /// Event name, e.g. `deposit.minted` or `withdraw.completed`.
    pub event: String,

    /// The operation amount.
    pub amount: Decimal,

    /// Mint/transfer transaction hash, on deposit notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,

    /// Burn transaction hash, on withdraw notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burn_tx_hash: Option<String>,

    /// Token contract address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stablecoin_address: Option<String>,

    /// Payout destination, on withdraw notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_address: Option<String>,

    /// Whether this deposit deployed the token contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_deployment: Option<bool>,

    /// When the notification was produced.
    pub timestamp: DateTime<Utc>,
}

/// Trait for delivering operation notifications to client webhooks.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers a payload to the given URL.
    async fn notify(&self, url: &str, payload: &NotificationPayload) -> Result<(), NotifierError>;
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    deliveries: Vec<(String, NotificationPayload)>,
    fail_on_notify: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures delivery to fail.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_notify = fail;
    }

    /// Returns the number of recorded deliveries.
    pub fn delivery_count(&self) -> usize {
        self.state.read().unwrap().deliveries.len()
    }

    /// Returns the recorded deliveries for a URL.
    pub fn deliveries_for(&self, url: &str) -> Vec<NotificationPayload> {
        self.state
            .read()
            .unwrap()
            .deliveries
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(&self, url: &str, payload: &NotificationPayload) -> Result<(), NotifierError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_notify {
            return Err(NotifierError("client webhook returned 500".to_string()));
        }

        state.deliveries.push((url.to_string(), payload.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payload() -> NotificationPayload {
        NotificationPayload {
            operation_id: AggregateId::new(),
            event: "deposit.minted".to_string(),
            amount: dec!(100),
            tx_hash: Some("0xmint".to_string()),
            burn_tx_hash: None,
            stablecoin_address: Some("0xcontract".to_string()),
            pix_address: None,
            first_deployment: Some(true),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_delivery_recorded() {
        let notifier = InMemoryNotifier::new();

        notifier
            .notify("https://client.example/webhook", &payload())
            .await
            .unwrap();

        assert_eq!(notifier.delivery_count(), 1);
        let delivered = notifier.deliveries_for("https://client.example/webhook");
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].event, "deposit.minted");
    }

    #[tokio::test]
    async fn test_failure_toggle() {
        let notifier = InMemoryNotifier::new();
        notifier.set_fail_on_notify(true);

        let result = notifier
            .notify("https://client.example/webhook", &payload())
            .await;

        assert!(result.is_err());
        assert_eq!(notifier.delivery_count(), 0);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let mut p = payload();
        p.burn_tx_hash = None;
        p.pix_address = None;

        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("burn_tx_hash").is_none());
        assert!(json.get("pix_address").is_none());
        assert!(json.get("tx_hash").is_some());
    }
}
