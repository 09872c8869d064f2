//! The operation orchestrator.
//!
//! One instance owns the domain services and the external collaborator
//! clients, and drives the deposit and withdraw sagas. Every webhook
//! delivery and API call runs as an independent task; correctness under
//! races rests entirely on the compare-and-transition writes in the
//! domain services.

use common::AggregateId;
use domain::operation::{CompleteWithdraw, ConfirmPayment, Operation, OperationEvent};
use domain::{
    Aggregate, ClientId, CommandResult, DomainError, OperationService, ProgramService,
    RegisterProgram, StablecoinProgram,
};
use event_log::EventLog;

use crate::clients::{AuthProvider, LedgerClient, NotificationPayload, Notifier, PaymentClient};
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, Result};
use crate::guard;
use crate::webhook::{self, PaymentConfirmedData, PayoutConfirmedData, RawDelivery};

/// Orchestrates deposit and withdraw operations end to end.
pub struct Orchestrator<S, L, P, N, A>
where
    S: EventLog + Clone,
    L: LedgerClient,
    P: PaymentClient,
    N: Notifier,
    A: AuthProvider,
{
    pub(crate) config: OrchestratorConfig,
    pub(crate) log: S,
    pub(crate) operations: OperationService<S>,
    pub(crate) programs: ProgramService<S>,
    pub(crate) ledger: L,
    pub(crate) payment: P,
    pub(crate) notifier: N,
    pub(crate) auth: A,
}

impl<S, L, P, N, A> Orchestrator<S, L, P, N, A>
where
    S: EventLog + Clone,
    L: LedgerClient,
    P: PaymentClient,
    N: Notifier,
    A: AuthProvider,
{
    /// Creates a new orchestrator.
    pub fn new(config: OrchestratorConfig, log: S, ledger: L, payment: P, notifier: N, auth: A) -> Self {
        let operations = OperationService::new(log.clone());
        let programs = ProgramService::new(log.clone());
        Self {
            config,
            log,
            operations,
            programs,
            ledger,
            payment,
            notifier,
            auth,
        }
    }

    /// Returns the operation service.
    pub fn operations(&self) -> &OperationService<S> {
        &self.operations
    }

    /// Returns the program service.
    pub fn programs(&self) -> &ProgramService<S> {
        &self.programs
    }

    /// Returns the underlying event log.
    pub fn log(&self) -> &S {
        &self.log
    }

    /// Resolves an API key to a client identity.
    pub async fn authenticate(&self, api_key: &str) -> Result<ClientId> {
        self.auth
            .authenticate(api_key)
            .await
            .ok_or_else(|| OrchestratorError::Authentication("unknown API key".to_string()))
    }

    /// Registers a stablecoin program for a client.
    #[tracing::instrument(skip(self))]
    pub async fn register_program(
        &self,
        cmd: RegisterProgram,
    ) -> Result<CommandResult<StablecoinProgram>> {
        self.programs.register_program(cmd).await.map_err(|e| match e {
            DomainError::DuplicateSymbol { symbol } => {
                OrchestratorError::Conflict(format!("symbol {symbol} is already registered"))
            }
            other => other.into(),
        })
    }

    /// Handles a payment-provider webhook delivery.
    ///
    /// Signature verification happens before any state access; after it
    /// passes, every outcome other than an infrastructure error is an
    /// acknowledgment. Unknown event types and unmatched references are
    /// no-ops.
    #[tracing::instrument(skip(self, raw_body, signature_header))]
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<()> {
        guard::verify_signature(raw_body, signature_header, &self.config.webhook_secret)?;
        let delivery = RawDelivery::parse(raw_body)?;

        metrics::counter!("webhook_deliveries_total").increment(1);

        match delivery.event.as_str() {
            webhook::events::PAYMENT_CONFIRMED => {
                let data: PaymentConfirmedData = serde_json::from_value(delivery.data)?;
                self.handle_payment_confirmed(data).await
            }
            webhook::events::PAYOUT_CONFIRMED => {
                let data: PayoutConfirmedData = serde_json::from_value(delivery.data)?;
                self.handle_payout_confirmed(data).await
            }
            other => {
                tracing::debug!(event = other, "ignoring unhandled webhook event");
                Ok(())
            }
        }
    }

    /// Reacts to a confirmed payment: advances the operation and runs
    /// the mint leg of the deposit saga.
    async fn handle_payment_confirmed(&self, data: PaymentConfirmedData) -> Result<()> {
        let Ok(operation_id) = AggregateId::parse_str(&data.external_reference) else {
            tracing::warn!(
                reference = %data.external_reference,
                "payment confirmation with unparsable reference, ignoring"
            );
            return Ok(());
        };

        if self.operations.get_operation(operation_id).await?.is_none() {
            tracing::warn!(%operation_id, "payment confirmation for unknown operation, ignoring");
            return Ok(());
        }

        let Some(_) = self
            .ignore_stale(self.operations.confirm_payment(ConfirmPayment::new(operation_id)).await)?
        else {
            // A competing delivery already confirmed; never re-run the saga.
            tracing::info!(%operation_id, "duplicate payment confirmation, ignoring");
            return Ok(());
        };

        self.run_mint_saga(operation_id).await
    }

    /// Reacts to a confirmed payout: completes the withdraw operation.
    async fn handle_payout_confirmed(&self, data: PayoutConfirmedData) -> Result<()> {
        let Some(operation_id) = self.find_operation_by_payout(&data.id).await? else {
            tracing::warn!(payout_id = %data.id, "payout confirmation for unknown payout, ignoring");
            return Ok(());
        };

        let Some(result) = self
            .ignore_stale(
                self.operations
                    .complete_withdraw(CompleteWithdraw::new(operation_id))
                    .await,
            )?
        else {
            tracing::info!(%operation_id, "duplicate payout confirmation, ignoring");
            return Ok(());
        };

        metrics::counter!("withdraw_completed").increment(1);
        self.notify_withdraw_completed(&result.aggregate).await;
        Ok(())
    }

    /// Locates the operation that initiated a payout, by provider
    /// reference. Scans the `PayoutInitiated` event type in the log.
    pub(crate) async fn find_operation_by_payout(
        &self,
        payout_id: &str,
    ) -> Result<Option<AggregateId>> {
        let envelopes = self.log.events_by_type("PayoutInitiated").await?;
        for envelope in envelopes {
            // Payloads are stored as the tagged OperationEvent enum.
            let event: OperationEvent = serde_json::from_value(envelope.payload)?;
            if let OperationEvent::PayoutInitiated(data) = event {
                if data.payout_id == payout_id {
                    return Ok(Some(envelope.aggregate_id));
                }
            }
        }
        Ok(None)
    }

    /// Maps a stale-state failure to `None`; other errors propagate.
    ///
    /// Stale state means a competing writer already handled the
    /// transition, which every saga treats as "nothing to do".
    pub(crate) fn ignore_stale(
        &self,
        result: std::result::Result<CommandResult<Operation>, DomainError>,
    ) -> Result<Option<CommandResult<Operation>>> {
        match result {
            Ok(r) => Ok(Some(r)),
            Err(e) if e.is_stale_state() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads the program an operation belongs to.
    pub(crate) async fn program_for(&self, operation: &Operation) -> Result<StablecoinProgram> {
        let program_id = operation
            .program_id()
            .ok_or_else(|| OrchestratorError::NotFound("operation has no program".to_string()))?;
        self.programs
            .get_program(program_id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("program {program_id} not found")))
    }

    /// Delivers a notification, logging failures instead of propagating
    /// them. Returns whether delivery succeeded.
    pub(crate) async fn notify_best_effort(
        &self,
        url: &str,
        payload: &NotificationPayload,
    ) -> bool {
        match self.notifier.notify(url, payload).await {
            Ok(()) => true,
            Err(e) => {
                metrics::counter!("notification_failures").increment(1);
                tracing::warn!(
                    operation_id = %payload.operation_id,
                    error = %e,
                    "client notification failed"
                );
                false
            }
        }
    }

    async fn notify_withdraw_completed(&self, operation: &Operation) {
        let Ok(program) = self.program_for(operation).await else {
            return;
        };
        let Some(operation_id) = operation.id() else {
            return;
        };
        let Some(amount) = operation.amount() else {
            return;
        };

        let payload = NotificationPayload {
            operation_id,
            event: "withdraw.completed".to_string(),
            amount: amount.as_decimal(),
            tx_hash: None,
            burn_tx_hash: operation.burn_tx_hash().map(|h| h.as_str().to_string()),
            stablecoin_address: program.contract_address().map(|a| a.as_str().to_string()),
            pix_address: program.payout_pix_key().map(|k| k.as_str().to_string()),
            first_deployment: None,
            timestamp: chrono::Utc::now(),
        };

        self.notify_best_effort(program.webhook_url(), &payload).await;
    }
}
