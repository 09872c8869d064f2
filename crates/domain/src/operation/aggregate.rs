//! Operation aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_log::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::value_objects::{Amount, ClientId, TxHash};

use super::{
    OperationError, OperationEvent, OperationKind, OperationStatus,
    events::{DepositRequestedData, WithdrawRequestedData},
};

/// Operation aggregate root.
///
/// One operation is one deposit or withdraw flow: the record every
/// webhook delivery and saga step converges on. Status moves only
/// forward along the state machine; amount and kind are immutable
/// after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    /// Unique operation identifier; doubles as the provider-facing
    /// external reference and idempotency key.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// The program this operation belongs to.
    program_id: Option<AggregateId>,

    /// The client that initiated the operation.
    client_id: Option<ClientId>,

    /// Deposit or withdraw, fixed at creation.
    kind: Option<OperationKind>,

    /// The amount, fixed at creation.
    amount: Option<Amount>,

    /// Current lifecycle status.
    status: OperationStatus,

    /// Provider-side collection reference (deposits).
    collection_id: Option<String>,

    /// Payment code artifact for the client (deposits).
    pay_code: Option<String>,

    /// Provider-side payout reference (withdraws).
    payout_id: Option<String>,

    /// Mint/transfer transaction hash (deposits).
    mint_tx_hash: Option<TxHash>,

    /// Burn transaction hash (withdraws).
    burn_tx_hash: Option<TxHash>,

    /// Error recorded on a failure transition.
    error_message: Option<String>,

    /// When the operation was created.
    created_at: Option<DateTime<Utc>>,

    /// When the operation reached a terminal status.
    finished_at: Option<DateTime<Utc>>,
}

impl Aggregate for Operation {
    type Event = OperationEvent;
    type Error = OperationError;

    fn aggregate_type() -> &'static str {
        "Operation"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OperationEvent::DepositRequested(data) => self.apply_deposit_requested(data),
            OperationEvent::CollectionCreated(data) => {
                self.collection_id = Some(data.collection_id);
                self.pay_code = Some(data.pay_code);
            }
            OperationEvent::PaymentConfirmed(_) => {
                self.status = OperationStatus::PaymentDeposited;
            }
            OperationEvent::MintingStarted(_) => {
                self.status = OperationStatus::MintingInProgress;
            }
            OperationEvent::MintSubmitted(data) => {
                self.mint_tx_hash = Some(data.tx_hash);
            }
            OperationEvent::Minted(data) => {
                self.status = OperationStatus::Minted;
                self.mint_tx_hash = Some(data.tx_hash);
            }
            OperationEvent::MintFailed(data) => {
                self.status = OperationStatus::MintFailed;
                self.error_message = Some(data.error);
                self.finished_at = Some(data.failed_at);
            }
            OperationEvent::ClientNotified(data) => {
                self.status = OperationStatus::ClientNotified;
                self.finished_at = Some(data.notified_at);
            }
            OperationEvent::WithdrawRequested(data) => self.apply_withdraw_requested(data),
            OperationEvent::BurnSubmitted(data) => {
                self.burn_tx_hash = Some(data.tx_hash);
            }
            OperationEvent::TokensBurned(data) => {
                self.status = OperationStatus::TokensBurned;
                self.burn_tx_hash = Some(data.tx_hash);
            }
            OperationEvent::BurnFailed(data) => {
                self.status = OperationStatus::BurnFailed;
                self.error_message = Some(data.error);
                self.finished_at = Some(data.failed_at);
            }
            OperationEvent::PayoutInitiated(data) => {
                self.status = OperationStatus::PixTransferPending;
                self.payout_id = Some(data.payout_id);
            }
            OperationEvent::PayoutFailed(data) => {
                self.status = OperationStatus::BurnSucceededPayoutFailed;
                self.error_message = Some(data.error);
                self.finished_at = Some(data.failed_at);
            }
            OperationEvent::WithdrawCompleted(data) => {
                self.status = OperationStatus::WithdrawSuccessful;
                self.finished_at = Some(data.completed_at);
            }
        }
    }
}

// Query methods
impl Operation {
    /// Returns the owning program ID.
    pub fn program_id(&self) -> Option<AggregateId> {
        self.program_id
    }

    /// Returns the initiating client ID.
    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    /// Returns the operation kind.
    pub fn kind(&self) -> Option<OperationKind> {
        self.kind
    }

    /// Returns the amount.
    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    /// Returns the current status.
    pub fn status(&self) -> OperationStatus {
        self.status
    }

    /// Returns the provider collection reference.
    pub fn collection_id(&self) -> Option<&str> {
        self.collection_id.as_deref()
    }

    /// Returns the payment code artifact.
    pub fn pay_code(&self) -> Option<&str> {
        self.pay_code.as_deref()
    }

    /// Returns the provider payout reference.
    pub fn payout_id(&self) -> Option<&str> {
        self.payout_id.as_deref()
    }

    /// Returns the mint/transfer transaction hash.
    pub fn mint_tx_hash(&self) -> Option<&TxHash> {
        self.mint_tx_hash.as_ref()
    }

    /// Returns the burn transaction hash.
    pub fn burn_tx_hash(&self) -> Option<&TxHash> {
        self.burn_tx_hash.as_ref()
    }

    /// Returns the recorded error message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns when the operation was created.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns when the operation reached a terminal status.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Returns true if the operation is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods (return events)
impl Operation {
    /// Creates a deposit operation in PaymentPending.
    pub fn request_deposit(
        &self,
        operation_id: AggregateId,
        program_id: AggregateId,
        client_id: ClientId,
        amount: Amount,
    ) -> Result<Vec<OperationEvent>, OperationError> {
        if self.id.is_some() {
            return Err(OperationError::AlreadyCreated);
        }

        Ok(vec![OperationEvent::deposit_requested(
            operation_id,
            program_id,
            client_id,
            amount,
        )])
    }

    /// Records the provider collection reference and payment code.
    pub fn attach_collection(
        &self,
        collection_id: impl Into<String>,
        pay_code: impl Into<String>,
    ) -> Result<Vec<OperationEvent>, OperationError> {
        if self.status != OperationStatus::PaymentPending || self.collection_id.is_some() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "attach collection",
            });
        }

        Ok(vec![OperationEvent::collection_created(
            collection_id,
            pay_code,
        )])
    }

    /// Confirms the client's payment.
    pub fn confirm_payment(&self) -> Result<Vec<OperationEvent>, OperationError> {
        if !self.status.can_confirm_payment() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "confirm payment",
            });
        }

        Ok(vec![OperationEvent::payment_confirmed()])
    }

    /// Starts ledger minting.
    pub fn start_minting(
        &self,
        first_deployment: bool,
    ) -> Result<Vec<OperationEvent>, OperationError> {
        if !self.status.can_start_minting() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "start minting",
            });
        }

        Ok(vec![OperationEvent::minting_started(first_deployment)])
    }

    /// Records the submitted mint/transfer transaction hash.
    pub fn record_mint_submission(
        &self,
        tx_hash: TxHash,
    ) -> Result<Vec<OperationEvent>, OperationError> {
        if !self.status.can_record_mint_outcome() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "record mint submission",
            });
        }

        Ok(vec![OperationEvent::mint_submitted(tx_hash)])
    }

    /// Records a confirmed mint.
    pub fn record_minted(&self, tx_hash: TxHash) -> Result<Vec<OperationEvent>, OperationError> {
        if !self.status.can_record_mint_outcome() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "record minted",
            });
        }

        Ok(vec![OperationEvent::minted(tx_hash)])
    }

    /// Records a mint failure.
    pub fn record_mint_failure(
        &self,
        error: impl Into<String>,
    ) -> Result<Vec<OperationEvent>, OperationError> {
        if !self.status.can_record_mint_outcome() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "record mint failure",
            });
        }

        Ok(vec![OperationEvent::mint_failed(error)])
    }

    /// Records the client notification attempt.
    pub fn record_notified(&self, delivered: bool) -> Result<Vec<OperationEvent>, OperationError> {
        if !self.status.can_record_notification() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "record notification",
            });
        }

        Ok(vec![OperationEvent::client_notified(delivered)])
    }

    /// Creates a withdraw operation in BurnInitiated.
    pub fn request_withdraw(
        &self,
        operation_id: AggregateId,
        program_id: AggregateId,
        client_id: ClientId,
        amount: Amount,
    ) -> Result<Vec<OperationEvent>, OperationError> {
        if self.id.is_some() {
            return Err(OperationError::AlreadyCreated);
        }

        Ok(vec![OperationEvent::withdraw_requested(
            operation_id,
            program_id,
            client_id,
            amount,
        )])
    }

    /// Records the submitted burn transaction hash.
    pub fn record_burn_submission(
        &self,
        tx_hash: TxHash,
    ) -> Result<Vec<OperationEvent>, OperationError> {
        if !self.status.can_record_burn_outcome() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "record burn submission",
            });
        }

        Ok(vec![OperationEvent::burn_submitted(tx_hash)])
    }

    /// Records a confirmed burn.
    pub fn record_burned(&self, tx_hash: TxHash) -> Result<Vec<OperationEvent>, OperationError> {
        if !self.status.can_record_burn_outcome() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "record burned",
            });
        }

        Ok(vec![OperationEvent::tokens_burned(tx_hash)])
    }

    /// Records a burn failure.
    pub fn record_burn_failure(
        &self,
        error: impl Into<String>,
    ) -> Result<Vec<OperationEvent>, OperationError> {
        if !self.status.can_record_burn_outcome() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "record burn failure",
            });
        }

        Ok(vec![OperationEvent::burn_failed(error)])
    }

    /// Records an accepted payout.
    pub fn record_payout_initiated(
        &self,
        payout_id: impl Into<String>,
    ) -> Result<Vec<OperationEvent>, OperationError> {
        if !self.status.can_record_payout_outcome() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "record payout initiation",
            });
        }

        Ok(vec![OperationEvent::payout_initiated(payout_id)])
    }

    /// Records a payout failure after a successful burn.
    pub fn record_payout_failure(
        &self,
        error: impl Into<String>,
    ) -> Result<Vec<OperationEvent>, OperationError> {
        if !self.status.can_record_payout_outcome() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "record payout failure",
            });
        }

        Ok(vec![OperationEvent::payout_failed(error)])
    }

    /// Completes the withdraw after payout confirmation.
    pub fn complete_withdraw(&self) -> Result<Vec<OperationEvent>, OperationError> {
        if !self.status.can_complete_withdraw() {
            return Err(OperationError::InvalidStateTransition {
                current_status: self.status,
                action: "complete withdraw",
            });
        }

        Ok(vec![OperationEvent::withdraw_completed()])
    }
}

// Apply event helpers
impl Operation {
    fn apply_deposit_requested(&mut self, data: DepositRequestedData) {
        self.id = Some(data.operation_id);
        self.program_id = Some(data.program_id);
        self.client_id = Some(data.client_id);
        self.kind = Some(OperationKind::Deposit);
        self.amount = Some(data.amount);
        self.status = OperationStatus::PaymentPending;
        self.created_at = Some(data.requested_at);
    }

    fn apply_withdraw_requested(&mut self, data: WithdrawRequestedData) {
        self.id = Some(data.operation_id);
        self.program_id = Some(data.program_id);
        self.client_id = Some(data.client_id);
        self.kind = Some(OperationKind::Withdraw);
        self.amount = Some(data.amount);
        self.status = OperationStatus::BurnInitiated;
        self.created_at = Some(data.requested_at);
    }
}
