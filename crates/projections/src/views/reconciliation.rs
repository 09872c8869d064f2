//! Reconciliation read model — withdraws where the burn succeeded but
//! the payout did not.
//!
//! These operations destroyed tokens without moving fiat, so they are
//! the first thing an operator has to look at. The view keeps enough
//! context from the withdraw lifecycle to act on each entry without
//! replaying the log.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{Amount, ClientId, OperationEvent, TxHash};
use event_log::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// A withdraw operation stuck in `BurnSucceededPayoutFailed`.
#[derive(Debug, Clone)]
pub struct ReconciliationEntry {
    pub operation_id: AggregateId,
    pub program_id: AggregateId,
    pub client_id: ClientId,
    pub amount: Amount,
    pub burn_tx_hash: Option<TxHash>,
    pub error: String,
    pub requested_at: DateTime<Utc>,
    pub failed_at: DateTime<Utc>,
}

/// Withdraw context accumulated before a payout outcome is known.
#[derive(Debug, Clone)]
struct PendingWithdraw {
    program_id: AggregateId,
    client_id: ClientId,
    amount: Amount,
    burn_tx_hash: Option<TxHash>,
    requested_at: DateTime<Utc>,
}

/// Read model view of operations needing operator reconciliation.
#[derive(Clone)]
pub struct ReconciliationView {
    pending: Arc<RwLock<HashMap<AggregateId, PendingWithdraw>>>,
    flagged: Arc<RwLock<HashMap<AggregateId, ReconciliationEntry>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl ReconciliationView {
    /// Creates a new empty reconciliation view.
    pub fn new() -> Self {
        Self {
            pending: Arc::new(RwLock::new(HashMap::new())),
            flagged: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets the reconciliation entry for an operation, if flagged.
    pub async fn get_entry(&self, operation_id: AggregateId) -> Option<ReconciliationEntry> {
        self.flagged.read().await.get(&operation_id).cloned()
    }

    /// Gets all flagged operations, oldest failure first.
    pub async fn get_flagged_operations(&self) -> Vec<ReconciliationEntry> {
        let mut entries: Vec<_> = self.flagged.read().await.values().cloned().collect();
        entries.sort_by_key(|e| e.failed_at);
        entries
    }

    /// Gets flagged operations for a specific program.
    pub async fn get_flagged_by_program(
        &self,
        program_id: AggregateId,
    ) -> Vec<ReconciliationEntry> {
        let mut entries: Vec<_> = self
            .flagged
            .read()
            .await
            .values()
            .filter(|e| e.program_id == program_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.failed_at);
        entries
    }
}

impl Default for ReconciliationView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for ReconciliationView {
    fn name(&self) -> &'static str {
        "ReconciliationView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Operation" {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            return Ok(());
        }

        let operation_event: OperationEvent = serde_json::from_value(event.payload.clone())?;
        let operation_id = event.aggregate_id;

        match operation_event {
            OperationEvent::WithdrawRequested(data) => {
                self.pending.write().await.insert(
                    operation_id,
                    PendingWithdraw {
                        program_id: data.program_id,
                        client_id: data.client_id,
                        amount: data.amount,
                        burn_tx_hash: None,
                        requested_at: data.requested_at,
                    },
                );
            }
            OperationEvent::TokensBurned(data) => {
                if let Some(pending) = self.pending.write().await.get_mut(&operation_id) {
                    pending.burn_tx_hash = Some(data.tx_hash);
                }
            }
            OperationEvent::PayoutFailed(data) => {
                if let Some(pending) = self.pending.write().await.remove(&operation_id) {
                    self.flagged.write().await.insert(
                        operation_id,
                        ReconciliationEntry {
                            operation_id,
                            program_id: pending.program_id,
                            client_id: pending.client_id,
                            amount: pending.amount,
                            burn_tx_hash: pending.burn_tx_hash,
                            error: data.error,
                            requested_at: pending.requested_at,
                            failed_at: data.failed_at,
                        },
                    );
                }
            }
            // Other withdraw outcomes never reach reconciliation.
            OperationEvent::BurnFailed(_) | OperationEvent::WithdrawCompleted(_) => {
                self.pending.write().await.remove(&operation_id);
            }
            _ => {}
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.pending.write().await.clear();
        self.flagged.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for ReconciliationView {
    fn name(&self) -> &'static str {
        "ReconciliationView"
    }

    fn count(&self) -> usize {
        // Use try_read to avoid blocking; returns 0 if lock is held
        self.flagged.try_read().map(|f| f.len()).unwrap_or(0)
    }
}
