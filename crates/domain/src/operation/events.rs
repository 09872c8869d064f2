//! Operation domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::{Amount, ClientId, TxHash};

/// Events that can occur on an operation aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationEvent {
    /// A deposit was requested.
    DepositRequested(DepositRequestedData),

    /// The payment provider accepted the collection request.
    CollectionCreated(CollectionCreatedData),

    /// The provider confirmed the client's payment.
    PaymentConfirmed(PaymentConfirmedData),

    /// Ledger minting started.
    MintingStarted(MintingStartedData),

    /// The mint/transfer transaction was submitted to the ledger.
    MintSubmitted(MintSubmittedData),

    /// Tokens were delivered to the client wallet.
    Minted(MintedData),

    /// The ledger mint/transfer failed.
    MintFailed(MintFailedData),

    /// The client webhook was notified.
    ClientNotified(ClientNotifiedData),

    /// A withdraw was requested.
    WithdrawRequested(WithdrawRequestedData),

    /// The burn transaction was submitted to the ledger.
    BurnSubmitted(BurnSubmittedData),

    /// Tokens were burned.
    TokensBurned(TokensBurnedData),

    /// The ledger burn failed.
    BurnFailed(BurnFailedData),

    /// The payout was accepted by the payment provider.
    PayoutInitiated(PayoutInitiatedData),

    /// The payout failed after the burn had succeeded.
    PayoutFailed(PayoutFailedData),

    /// The payout was confirmed and the withdraw completed.
    WithdrawCompleted(WithdrawCompletedData),
}

impl DomainEvent for OperationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OperationEvent::DepositRequested(_) => "DepositRequested",
            OperationEvent::CollectionCreated(_) => "CollectionCreated",
            OperationEvent::PaymentConfirmed(_) => "PaymentConfirmed",
            OperationEvent::MintingStarted(_) => "MintingStarted",
            OperationEvent::MintSubmitted(_) => "MintSubmitted",
            OperationEvent::Minted(_) => "Minted",
            OperationEvent::MintFailed(_) => "MintFailed",
            OperationEvent::ClientNotified(_) => "ClientNotified",
            OperationEvent::WithdrawRequested(_) => "WithdrawRequested",
            OperationEvent::BurnSubmitted(_) => "BurnSubmitted",
            OperationEvent::TokensBurned(_) => "TokensBurned",
            OperationEvent::BurnFailed(_) => "BurnFailed",
            OperationEvent::PayoutInitiated(_) => "PayoutInitiated",
            OperationEvent::PayoutFailed(_) => "PayoutFailed",
            OperationEvent::WithdrawCompleted(_) => "WithdrawCompleted",
        }
    }
}

/// Data for DepositRequested event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequestedData {
    /// The operation ID (also the provider-facing external reference).
    pub operation_id: AggregateId,

    /// The program this deposit mints against.
    pub program_id: AggregateId,

    /// The client that requested the deposit.
    pub client_id: ClientId,

    /// The fiat amount to collect and mint.
    pub amount: Amount,

    /// When the deposit was requested.
    pub requested_at: DateTime<Utc>,
}

/// Data for CollectionCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionCreatedData {
    /// Provider-side collection identifier.
    pub collection_id: String,

    /// Payment code artifact (QR / copy-paste payload) for the client.
    pub pay_code: String,

    /// When the collection was created.
    pub created_at: DateTime<Utc>,
}

/// Data for PaymentConfirmed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmedData {
    /// When the provider confirmed the payment.
    pub confirmed_at: DateTime<Utc>,
}

/// Data for MintingStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintingStartedData {
    /// When minting started.
    pub started_at: DateTime<Utc>,

    /// Whether this deposit triggers the program's first contract deployment.
    pub first_deployment: bool,
}

/// Data for MintSubmitted event.
///
/// Recorded before the confirmation wait so a crash mid-wait can resume
/// by re-checking confirmation instead of resubmitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintSubmittedData {
    /// Hash of the submitted mint/transfer transaction.
    pub tx_hash: TxHash,

    /// When the transaction was submitted.
    pub submitted_at: DateTime<Utc>,
}

/// Data for Minted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintedData {
    /// Hash of the confirmed mint/transfer transaction.
    pub tx_hash: TxHash,

    /// When the mint was confirmed.
    pub minted_at: DateTime<Utc>,
}

/// Data for MintFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintFailedData {
    /// What went wrong.
    pub error: String,

    /// When the failure was recorded.
    pub failed_at: DateTime<Utc>,
}

/// Data for ClientNotified event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientNotifiedData {
    /// When the notification was attempted.
    pub notified_at: DateTime<Utc>,

    /// Whether the client webhook accepted the delivery. Delivery
    /// failure is recorded but never blocks the transition.
    pub delivered: bool,
}

/// Data for WithdrawRequested event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequestedData {
    /// The operation ID.
    pub operation_id: AggregateId,

    /// The program this withdraw burns against.
    pub program_id: AggregateId,

    /// The client that requested the withdraw.
    pub client_id: ClientId,

    /// The amount to burn and pay out.
    pub amount: Amount,

    /// When the withdraw was requested.
    pub requested_at: DateTime<Utc>,
}

/// Data for BurnSubmitted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurnSubmittedData {
    /// Hash of the submitted burn transaction.
    pub tx_hash: TxHash,

    /// When the transaction was submitted.
    pub submitted_at: DateTime<Utc>,
}

/// Data for TokensBurned event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensBurnedData {
    /// Hash of the confirmed burn transaction.
    pub tx_hash: TxHash,

    /// When the burn was confirmed.
    pub burned_at: DateTime<Utc>,
}

/// Data for BurnFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurnFailedData {
    /// What went wrong.
    pub error: String,

    /// When the failure was recorded.
    pub failed_at: DateTime<Utc>,
}

/// Data for PayoutInitiated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutInitiatedData {
    /// Provider-side payout identifier.
    pub payout_id: String,

    /// When the payout was accepted.
    pub initiated_at: DateTime<Utc>,
}

/// Data for PayoutFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutFailedData {
    /// What went wrong. Tokens were already burned at this point.
    pub error: String,

    /// When the failure was recorded.
    pub failed_at: DateTime<Utc>,
}

/// Data for WithdrawCompleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawCompletedData {
    /// When the payout was confirmed.
    pub completed_at: DateTime<Utc>,
}

// Convenience constructors for events
impl OperationEvent {
    /// Creates a DepositRequested event.
    pub fn deposit_requested(
        operation_id: AggregateId,
        program_id: AggregateId,
        client_id: ClientId,
        amount: Amount,
    ) -> Self {
        OperationEvent::DepositRequested(DepositRequestedData {
            operation_id,
            program_id,
            client_id,
            amount,
            requested_at: Utc::now(),
        })
    }

    /// Creates a CollectionCreated event.
    pub fn collection_created(collection_id: impl Into<String>, pay_code: impl Into<String>) -> Self {
        OperationEvent::CollectionCreated(CollectionCreatedData {
            collection_id: collection_id.into(),
            pay_code: pay_code.into(),
            created_at: Utc::now(),
        })
    }

    /// Creates a PaymentConfirmed event.
    pub fn payment_confirmed() -> Self {
        OperationEvent::PaymentConfirmed(PaymentConfirmedData {
            confirmed_at: Utc::now(),
        })
    }

    /// Creates a MintingStarted event.
    pub fn minting_started(first_deployment: bool) -> Self {
        OperationEvent::MintingStarted(MintingStartedData {
            started_at: Utc::now(),
            first_deployment,
        })
    }

    /// Creates a MintSubmitted event.
    pub fn mint_submitted(tx_hash: TxHash) -> Self {
        OperationEvent::MintSubmitted(MintSubmittedData {
            tx_hash,
            submitted_at: Utc::now(),
        })
    }

    /// Creates a Minted event.
    pub fn minted(tx_hash: TxHash) -> Self {
        OperationEvent::Minted(MintedData {
            tx_hash,
            minted_at: Utc::now(),
        })
    }

    /// Creates a MintFailed event.
    pub fn mint_failed(error: impl Into<String>) -> Self {
        OperationEvent::MintFailed(MintFailedData {
            error: error.into(),
            failed_at: Utc::now(),
        })
    }

    /// Creates a ClientNotified event.
    pub fn client_notified(delivered: bool) -> Self {
        OperationEvent::ClientNotified(ClientNotifiedData {
            notified_at: Utc::now(),
            delivered,
        })
    }

    /// Creates a WithdrawRequested event.
    pub fn withdraw_requested(
        operation_id: AggregateId,
        program_id: AggregateId,
        client_id: ClientId,
        amount: Amount,
    ) -> Self {
        OperationEvent::WithdrawRequested(WithdrawRequestedData {
            operation_id,
            program_id,
            client_id,
            amount,
            requested_at: Utc::now(),
        })
    }

    /// Creates a BurnSubmitted event.
    pub fn burn_submitted(tx_hash: TxHash) -> Self {
        OperationEvent::BurnSubmitted(BurnSubmittedData {
            tx_hash,
            submitted_at: Utc::now(),
        })
    }

    /// Creates a TokensBurned event.
    pub fn tokens_burned(tx_hash: TxHash) -> Self {
        OperationEvent::TokensBurned(TokensBurnedData {
            tx_hash,
            burned_at: Utc::now(),
        })
    }

    /// Creates a BurnFailed event.
    pub fn burn_failed(error: impl Into<String>) -> Self {
        OperationEvent::BurnFailed(BurnFailedData {
            error: error.into(),
            failed_at: Utc::now(),
        })
    }

    /// Creates a PayoutInitiated event.
    pub fn payout_initiated(payout_id: impl Into<String>) -> Self {
        OperationEvent::PayoutInitiated(PayoutInitiatedData {
            payout_id: payout_id.into(),
            initiated_at: Utc::now(),
        })
    }

    /// Creates a PayoutFailed event.
    pub fn payout_failed(error: impl Into<String>) -> Self {
        OperationEvent::PayoutFailed(PayoutFailedData {
            error: error.into(),
            failed_at: Utc::now(),
        })
    }

    /// Creates a WithdrawCompleted event.
    pub fn withdraw_completed() -> Self {
        OperationEvent::WithdrawCompleted(WithdrawCompletedData {
            completed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    #[test]
    fn test_event_type() {
        let op_id = AggregateId::new();
        let program_id = AggregateId::new();
        let client_id = ClientId::new();

        let event =
            OperationEvent::deposit_requested(op_id, program_id, client_id, amount(dec!(100)));
        assert_eq!(event.event_type(), "DepositRequested");

        let event = OperationEvent::collection_created("col-1", "pix-code");
        assert_eq!(event.event_type(), "CollectionCreated");

        let event = OperationEvent::payment_confirmed();
        assert_eq!(event.event_type(), "PaymentConfirmed");

        let event = OperationEvent::minting_started(true);
        assert_eq!(event.event_type(), "MintingStarted");

        let event = OperationEvent::mint_submitted(TxHash::new("0xaa"));
        assert_eq!(event.event_type(), "MintSubmitted");

        let event = OperationEvent::minted(TxHash::new("0xaa"));
        assert_eq!(event.event_type(), "Minted");

        let event = OperationEvent::mint_failed("out of gas");
        assert_eq!(event.event_type(), "MintFailed");

        let event = OperationEvent::client_notified(true);
        assert_eq!(event.event_type(), "ClientNotified");

        let event =
            OperationEvent::withdraw_requested(op_id, program_id, client_id, amount(dec!(50)));
        assert_eq!(event.event_type(), "WithdrawRequested");

        let event = OperationEvent::burn_submitted(TxHash::new("0xbb"));
        assert_eq!(event.event_type(), "BurnSubmitted");

        let event = OperationEvent::tokens_burned(TxHash::new("0xbb"));
        assert_eq!(event.event_type(), "TokensBurned");

        let event = OperationEvent::burn_failed("insufficient balance");
        assert_eq!(event.event_type(), "BurnFailed");

        let event = OperationEvent::payout_initiated("payout-1");
        assert_eq!(event.event_type(), "PayoutInitiated");

        let event = OperationEvent::payout_failed("provider rejected destination");
        assert_eq!(event.event_type(), "PayoutFailed");

        let event = OperationEvent::withdraw_completed();
        assert_eq!(event.event_type(), "WithdrawCompleted");
    }

    #[test]
    fn test_event_serialization() {
        let op_id = AggregateId::new();
        let program_id = AggregateId::new();
        let client_id = ClientId::new();
        let event =
            OperationEvent::deposit_requested(op_id, program_id, client_id, amount(dec!(150.00)));

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("DepositRequested"));

        let deserialized: OperationEvent = serde_json::from_str(&json).unwrap();
        if let OperationEvent::DepositRequested(data) = deserialized {
            assert_eq!(data.operation_id, op_id);
            assert_eq!(data.program_id, program_id);
            assert_eq!(data.amount, amount(dec!(150.00)));
        } else {
            panic!("Expected DepositRequested event");
        }
    }

    #[test]
    fn test_payout_failed_serialization() {
        let event = OperationEvent::payout_failed("tokens burned without a corresponding payout");

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: OperationEvent = serde_json::from_str(&json).unwrap();

        if let OperationEvent::PayoutFailed(data) = deserialized {
            assert_eq!(data.error, "tokens burned without a corresponding payout");
        } else {
            panic!("Expected PayoutFailed event");
        }
    }
}
