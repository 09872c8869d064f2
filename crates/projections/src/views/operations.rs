//! Operations read model — every operation, queryable by status.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{Amount, ClientId, OperationEvent, OperationKind, OperationStatus, TxHash};
use event_log::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Denormalized summary of a single operation.
#[derive(Debug, Clone)]
pub struct OperationSummary {
    pub operation_id: AggregateId,
    pub program_id: AggregateId,
    pub client_id: ClientId,
    pub kind: OperationKind,
    pub status: OperationStatus,
    pub amount: Amount,
    pub collection_id: Option<String>,
    pub pay_code: Option<String>,
    pub payout_id: Option<String>,
    pub mint_tx_hash: Option<TxHash>,
    pub burn_tx_hash: Option<TxHash>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read model view over all operations.
///
/// Unlike the aggregate, this view keeps terminal operations around;
/// status queries are how operators and the API find stuck or failed
/// flows without replaying the log.
#[derive(Clone)]
pub struct OperationsView {
    operations: Arc<RwLock<HashMap<AggregateId, OperationSummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl OperationsView {
    /// Creates a new empty operations view.
    pub fn new() -> Self {
        Self {
            operations: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets a summary of a specific operation.
    pub async fn get_operation(&self, operation_id: AggregateId) -> Option<OperationSummary> {
        self.operations.read().await.get(&operation_id).cloned()
    }

    /// Gets all operations.
    pub async fn get_all_operations(&self) -> Vec<OperationSummary> {
        self.operations.read().await.values().cloned().collect()
    }

    /// Gets operations in a specific status.
    pub async fn get_operations_by_status(
        &self,
        status: OperationStatus,
    ) -> Vec<OperationSummary> {
        self.operations
            .read()
            .await
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect()
    }

    /// Gets operations belonging to a specific program.
    pub async fn get_operations_by_program(
        &self,
        program_id: AggregateId,
    ) -> Vec<OperationSummary> {
        self.operations
            .read()
            .await
            .values()
            .filter(|o| o.program_id == program_id)
            .cloned()
            .collect()
    }

    /// Gets operations initiated by a specific client.
    pub async fn get_operations_by_client(&self, client_id: ClientId) -> Vec<OperationSummary> {
        self.operations
            .read()
            .await
            .values()
            .filter(|o| o.client_id == client_id)
            .cloned()
            .collect()
    }

    /// Gets operations that have not reached a terminal status.
    pub async fn get_active_operations(&self) -> Vec<OperationSummary> {
        self.operations
            .read()
            .await
            .values()
            .filter(|o| !o.status.is_terminal())
            .cloned()
            .collect()
    }
}

impl Default for OperationsView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for OperationsView {
    fn name(&self) -> &'static str {
        "OperationsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Operation" {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            return Ok(());
        }

        let operation_event: OperationEvent = serde_json::from_value(event.payload.clone())?;
        let operation_id = event.aggregate_id;

        let mut operations = self.operations.write().await;

        match operation_event {
            OperationEvent::DepositRequested(data) => {
                operations.insert(
                    operation_id,
                    OperationSummary {
                        operation_id,
                        program_id: data.program_id,
                        client_id: data.client_id,
                        kind: OperationKind::Deposit,
                        status: OperationStatus::PaymentPending,
                        amount: data.amount,
                        collection_id: None,
                        pay_code: None,
                        payout_id: None,
                        mint_tx_hash: None,
                        burn_tx_hash: None,
                        error: None,
                        created_at: data.requested_at,
                        updated_at: data.requested_at,
                    },
                );
            }
            OperationEvent::CollectionCreated(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.collection_id = Some(data.collection_id);
                    op.pay_code = Some(data.pay_code);
                    op.updated_at = data.created_at;
                }
            }
            OperationEvent::PaymentConfirmed(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.status = OperationStatus::PaymentDeposited;
                    op.updated_at = data.confirmed_at;
                }
            }
            OperationEvent::MintingStarted(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.status = OperationStatus::MintingInProgress;
                    op.updated_at = data.started_at;
                }
            }
            OperationEvent::MintSubmitted(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.mint_tx_hash = Some(data.tx_hash);
                    op.updated_at = data.submitted_at;
                }
            }
            OperationEvent::Minted(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.status = OperationStatus::Minted;
                    op.mint_tx_hash = Some(data.tx_hash);
                    op.updated_at = data.minted_at;
                }
            }
            OperationEvent::MintFailed(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.status = OperationStatus::MintFailed;
                    op.error = Some(data.error);
                    op.updated_at = data.failed_at;
                }
            }
            OperationEvent::ClientNotified(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.status = OperationStatus::ClientNotified;
                    op.updated_at = data.notified_at;
                }
            }
            OperationEvent::WithdrawRequested(data) => {
                operations.insert(
                    operation_id,
                    OperationSummary {
                        operation_id,
                        program_id: data.program_id,
                        client_id: data.client_id,
                        kind: OperationKind::Withdraw,
                        status: OperationStatus::BurnInitiated,
                        amount: data.amount,
                        collection_id: None,
                        pay_code: None,
                        payout_id: None,
                        mint_tx_hash: None,
                        burn_tx_hash: None,
                        error: None,
                        created_at: data.requested_at,
                        updated_at: data.requested_at,
                    },
                );
            }
            OperationEvent::BurnSubmitted(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.burn_tx_hash = Some(data.tx_hash);
                    op.updated_at = data.submitted_at;
                }
            }
            OperationEvent::TokensBurned(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.status = OperationStatus::TokensBurned;
                    op.burn_tx_hash = Some(data.tx_hash);
                    op.updated_at = data.burned_at;
                }
            }
            OperationEvent::BurnFailed(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.status = OperationStatus::BurnFailed;
                    op.error = Some(data.error);
                    op.updated_at = data.failed_at;
                }
            }
            OperationEvent::PayoutInitiated(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.status = OperationStatus::PixTransferPending;
                    op.payout_id = Some(data.payout_id);
                    op.updated_at = data.initiated_at;
                }
            }
            OperationEvent::PayoutFailed(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.status = OperationStatus::BurnSucceededPayoutFailed;
                    op.error = Some(data.error);
                    op.updated_at = data.failed_at;
                }
            }
            OperationEvent::WithdrawCompleted(data) => {
                if let Some(op) = operations.get_mut(&operation_id) {
                    op.status = OperationStatus::WithdrawSuccessful;
                    op.updated_at = data.completed_at;
                }
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.operations.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for OperationsView {
    fn name(&self) -> &'static str {
        "OperationsView"
    }

    fn count(&self) -> usize {
        // Use try_read to avoid blocking; returns 0 if lock is held
        self.operations.try_read().map(|o| o.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DomainEvent;
    use rust_decimal_macros::dec;

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    fn make_envelope(
        aggregate_id: AggregateId,
        version: i64,
        event: &OperationEvent,
    ) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Operation")
            .event_type(event.event_type())
            .version(event_log::Version::new(version))
            .payload(event)
            .unwrap()
            .build()
    }

    #[tokio::test]
    async fn test_deposit_requested_creates_entry() {
        let view = OperationsView::new();
        let op_id = AggregateId::new();
        let program_id = AggregateId::new();
        let client_id = ClientId::new();

        let event =
            OperationEvent::deposit_requested(op_id, program_id, client_id, amount(dec!(100)));
        view.handle(&make_envelope(op_id, 1, &event)).await.unwrap();

        let op = view.get_operation(op_id).await.unwrap();
        assert_eq!(op.kind, OperationKind::Deposit);
        assert_eq!(op.status, OperationStatus::PaymentPending);
        assert_eq!(op.program_id, program_id);
        assert_eq!(op.amount, amount(dec!(100)));
    }

    #[tokio::test]
    async fn test_deposit_lifecycle_updates_status() {
        let view = OperationsView::new();
        let op_id = AggregateId::new();

        let event = OperationEvent::deposit_requested(
            op_id,
            AggregateId::new(),
            ClientId::new(),
            amount(dec!(50)),
        );
        view.handle(&make_envelope(op_id, 1, &event)).await.unwrap();

        let event = OperationEvent::collection_created("col-1", "pix-code");
        view.handle(&make_envelope(op_id, 2, &event)).await.unwrap();

        let event = OperationEvent::payment_confirmed();
        view.handle(&make_envelope(op_id, 3, &event)).await.unwrap();

        let event = OperationEvent::minting_started(false);
        view.handle(&make_envelope(op_id, 4, &event)).await.unwrap();

        let event = OperationEvent::minted(TxHash::new("0xaa"));
        view.handle(&make_envelope(op_id, 5, &event)).await.unwrap();

        let op = view.get_operation(op_id).await.unwrap();
        assert_eq!(op.status, OperationStatus::Minted);
        assert_eq!(op.collection_id, Some("col-1".to_string()));
        assert_eq!(op.pay_code, Some("pix-code".to_string()));
        assert_eq!(op.mint_tx_hash, Some(TxHash::new("0xaa")));
    }

    #[tokio::test]
    async fn test_terminal_operations_stay_in_view() {
        let view = OperationsView::new();
        let op_id = AggregateId::new();

        let event = OperationEvent::deposit_requested(
            op_id,
            AggregateId::new(),
            ClientId::new(),
            amount(dec!(10)),
        );
        view.handle(&make_envelope(op_id, 1, &event)).await.unwrap();

        let event = OperationEvent::payment_confirmed();
        view.handle(&make_envelope(op_id, 2, &event)).await.unwrap();

        let event = OperationEvent::minting_started(false);
        view.handle(&make_envelope(op_id, 3, &event)).await.unwrap();

        let event = OperationEvent::mint_failed("out of gas");
        view.handle(&make_envelope(op_id, 4, &event)).await.unwrap();

        let op = view.get_operation(op_id).await.unwrap();
        assert_eq!(op.status, OperationStatus::MintFailed);
        assert_eq!(op.error, Some("out of gas".to_string()));

        let failed = view
            .get_operations_by_status(OperationStatus::MintFailed)
            .await;
        assert_eq!(failed.len(), 1);
        assert!(view.get_active_operations().await.is_empty());
    }

    #[tokio::test]
    async fn test_withdraw_partial_failure_status() {
        let view = OperationsView::new();
        let op_id = AggregateId::new();

        let event = OperationEvent::withdraw_requested(
            op_id,
            AggregateId::new(),
            ClientId::new(),
            amount(dec!(25)),
        );
        view.handle(&make_envelope(op_id, 1, &event)).await.unwrap();

        let event = OperationEvent::tokens_burned(TxHash::new("0xbb"));
        view.handle(&make_envelope(op_id, 2, &event)).await.unwrap();

        let event = OperationEvent::payout_failed("provider rejected destination");
        view.handle(&make_envelope(op_id, 3, &event)).await.unwrap();

        let op = view.get_operation(op_id).await.unwrap();
        assert_eq!(op.status, OperationStatus::BurnSucceededPayoutFailed);
        assert_eq!(op.burn_tx_hash, Some(TxHash::new("0xbb")));
        assert_eq!(op.error, Some("provider rejected destination".to_string()));
    }

    #[tokio::test]
    async fn test_filter_by_status_and_program() {
        let view = OperationsView::new();
        let program1 = AggregateId::new();
        let program2 = AggregateId::new();
        let client_id = ClientId::new();

        let op1 = AggregateId::new();
        let event = OperationEvent::deposit_requested(op1, program1, client_id, amount(dec!(1)));
        view.handle(&make_envelope(op1, 1, &event)).await.unwrap();

        let op2 = AggregateId::new();
        let event = OperationEvent::withdraw_requested(op2, program2, client_id, amount(dec!(2)));
        view.handle(&make_envelope(op2, 1, &event)).await.unwrap();

        let pending = view
            .get_operations_by_status(OperationStatus::PaymentPending)
            .await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].operation_id, op1);

        let for_program2 = view.get_operations_by_program(program2).await;
        assert_eq!(for_program2.len(), 1);
        assert_eq!(for_program2[0].operation_id, op2);

        assert_eq!(view.get_operations_by_client(client_id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_skips_non_operation_events() {
        let view = OperationsView::new();

        let envelope = EventEnvelope::builder()
            .aggregate_id(AggregateId::new())
            .aggregate_type("StablecoinProgram")
            .event_type("ProgramRegistered")
            .version(event_log::Version::new(1))
            .payload_raw(serde_json::json!({"symbol": "BRLX"}))
            .build();

        view.handle(&envelope).await.unwrap();
        assert!(view.get_all_operations().await.is_empty());
        assert_eq!(view.position().await.events_processed, 1);
    }

    #[tokio::test]
    async fn test_reset() {
        let view = OperationsView::new();
        let op_id = AggregateId::new();

        let event = OperationEvent::deposit_requested(
            op_id,
            AggregateId::new(),
            ClientId::new(),
            amount(dec!(5)),
        );
        view.handle(&make_envelope(op_id, 1, &event)).await.unwrap();
        assert_eq!(view.get_all_operations().await.len(), 1);

        view.reset().await.unwrap();

        assert!(view.get_all_operations().await.is_empty());
        assert_eq!(view.position().await.events_processed, 0);
    }
}
