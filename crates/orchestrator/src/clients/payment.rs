//! Payment-provider client trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{Amount, PixKey};
use thiserror::Error;

use crate::guard;

/// Errors from the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The provider rejected the request. Terminal for the step.
    #[error("Provider rejected the request: {0}")]
    Business(String),

    /// The provider was unreachable. Retryable by the caller.
    #[error("Provider unreachable: {0}")]
    Transport(String),
}

/// A collection created at the provider for an inbound payment.
#[derive(Debug, Clone)]
pub struct Collection {
    /// Provider-side collection identifier.
    pub provider_id: String,

    /// Payment code artifact (QR / copy-paste payload) for the payer.
    pub pay_code: String,
}

/// A payout accepted by the provider.
#[derive(Debug, Clone)]
pub struct Payout {
    /// Provider-side payout identifier.
    pub provider_id: String,
}

/// Trait for off-chain payment operations.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// Creates a collection the end customer can pay. The external
    /// reference is echoed back in the confirmation webhook.
    async fn create_collection(
        &self,
        amount: Amount,
        external_reference: &str,
        description: &str,
    ) -> Result<Collection, PaymentError>;

    /// Creates a payout to a PIX destination.
    async fn create_payout(
        &self,
        destination: &PixKey,
        amount: Amount,
        description: &str,
    ) -> Result<Payout, PaymentError>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    collections: HashMap<String, (Amount, String)>,
    payouts: HashMap<String, (PixKey, Amount)>,
    next_id: u32,
    fail_on_collection: bool,
    payout_business_failure: bool,
    payout_transport_failure: bool,
}

/// In-memory payment provider for testing.
///
/// Records collections and payouts, and can sign webhook bodies the way
/// the real provider would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentProvider {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentProvider {
    /// Creates a new in-memory payment provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures collection creation to fail.
    pub fn set_fail_on_collection(&self, fail: bool) {
        self.state.write().unwrap().fail_on_collection = fail;
    }

    /// Configures payout creation to fail with a business rejection.
    pub fn set_payout_business_failure(&self, fail: bool) {
        self.state.write().unwrap().payout_business_failure = fail;
    }

    /// Configures payout creation to fail with a transport error.
    pub fn set_payout_transport_failure(&self, fail: bool) {
        self.state.write().unwrap().payout_transport_failure = fail;
    }

    /// Returns the number of created collections.
    pub fn collection_count(&self) -> usize {
        self.state.read().unwrap().collections.len()
    }

    /// Returns the number of accepted payouts.
    pub fn payout_count(&self) -> usize {
        self.state.read().unwrap().payouts.len()
    }

    /// Returns the external reference recorded for a collection.
    pub fn collection_reference(&self, provider_id: &str) -> Option<String> {
        self.state
            .read()
            .unwrap()
            .collections
            .get(provider_id)
            .map(|(_, reference)| reference.clone())
    }

    /// Signs a webhook body with the given secret, as the provider does
    /// on delivery.
    pub fn sign(&self, raw_body: &[u8], secret: &str) -> String {
        guard::sign(raw_body, secret)
    }
}

#[async_trait]
impl PaymentClient for InMemoryPaymentProvider {
    async fn create_collection(
        &self,
        amount: Amount,
        external_reference: &str,
        _description: &str,
    ) -> Result<Collection, PaymentError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_collection {
            return Err(PaymentError::Transport("provider timeout".to_string()));
        }

        state.next_id += 1;
        let provider_id = format!("col-{:04}", state.next_id);
        let pay_code = format!("pix-code-{:04}", state.next_id);
        state
            .collections
            .insert(provider_id.clone(), (amount, external_reference.to_string()));

        Ok(Collection {
            provider_id,
            pay_code,
        })
    }

    async fn create_payout(
        &self,
        destination: &PixKey,
        amount: Amount,
        _description: &str,
    ) -> Result<Payout, PaymentError> {
        let mut state = self.state.write().unwrap();

        if state.payout_business_failure {
            return Err(PaymentError::Business("payout key rejected".to_string()));
        }
        if state.payout_transport_failure {
            return Err(PaymentError::Transport("provider timeout".to_string()));
        }

        state.next_id += 1;
        let provider_id = format!("payout-{:04}", state.next_id);
        state
            .payouts
            .insert(provider_id.clone(), (destination.clone(), amount));

        Ok(Payout { provider_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_collection_records_reference() {
        let provider = InMemoryPaymentProvider::new();

        let collection = provider
            .create_collection(amount(dec!(100)), "op-123", "deposit")
            .await
            .unwrap();

        assert!(collection.provider_id.starts_with("col-"));
        assert!(collection.pay_code.starts_with("pix-code-"));
        assert_eq!(
            provider.collection_reference(&collection.provider_id),
            Some("op-123".to_string())
        );
    }

    #[tokio::test]
    async fn test_payout_business_failure() {
        let provider = InMemoryPaymentProvider::new();
        provider.set_payout_business_failure(true);

        let result = provider
            .create_payout(&PixKey::new("dest@bank.example"), amount(dec!(50)), "payout")
            .await;

        assert!(matches!(result, Err(PaymentError::Business(_))));
        assert_eq!(provider.payout_count(), 0);
    }

    #[tokio::test]
    async fn test_payout_transport_failure() {
        let provider = InMemoryPaymentProvider::new();
        provider.set_payout_transport_failure(true);

        let result = provider
            .create_payout(&PixKey::new("dest@bank.example"), amount(dec!(50)), "payout")
            .await;

        assert!(matches!(result, Err(PaymentError::Transport(_))));
    }

    #[tokio::test]
    async fn test_successful_payout_recorded() {
        let provider = InMemoryPaymentProvider::new();

        let payout = provider
            .create_payout(&PixKey::new("dest@bank.example"), amount(dec!(50)), "payout")
            .await
            .unwrap();

        assert!(payout.provider_id.starts_with("payout-"));
        assert_eq!(provider.payout_count(), 1);
    }
}
