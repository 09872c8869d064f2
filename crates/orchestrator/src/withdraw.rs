//! Withdraw saga: tokens burned, fiat paid out.
//!
//! `BurnInitiated → {TokensBurned | BurnFailed}`; `TokensBurned →
//! PixTransferPending → WithdrawSuccessful`. A payout failure after a
//! successful burn parks the operation in `BurnSucceededPayoutFailed`,
//! never `BurnFailed`: the distinction is what the reconciliation view
//! keys on.

use common::AggregateId;
use domain::operation::{
    OperationStatus, RecordBurnFailure, RecordBurnSubmission, RecordPayoutFailure,
    RecordPayoutInitiated, RecordTokensBurned, RequestWithdraw,
};
use domain::{Amount, ClientId, ProgramStatus, TxHash};
use event_log::EventLog;

use crate::clients::{AuthProvider, LedgerClient, Notifier, PaymentClient, PaymentError};
use crate::coordinator::Orchestrator;
use crate::error::{OrchestratorError, Result};

/// What a caller gets back from a successful withdraw request.
///
/// The payout is still in flight at this point; `WithdrawSuccessful`
/// arrives later via the payout confirmation webhook.
#[derive(Debug, Clone)]
pub struct WithdrawReceipt {
    /// The new operation.
    pub operation_id: AggregateId,

    /// Provider-side payout identifier.
    pub payout_id: String,

    /// The confirmed burn transaction hash.
    pub burn_tx_hash: TxHash,

    /// Operation status after the request (`PixTransferPending`).
    pub status: OperationStatus,
}

impl<S, L, P, N, A> Orchestrator<S, L, P, N, A>
where
    S: EventLog + Clone,
    L: LedgerClient,
    P: PaymentClient,
    N: Notifier,
    A: AuthProvider,
{
    /// Burns tokens and initiates the off-chain payout.
    ///
    /// Once the burn transaction is submitted it is never abandoned:
    /// the outcome is awaited and recorded on the operation, and the
    /// error returned to the caller says whether the burn happened.
    #[tracing::instrument(skip(self))]
    pub async fn request_withdraw(
        &self,
        client_id: ClientId,
        program_id: AggregateId,
        amount: Amount,
    ) -> Result<WithdrawReceipt> {
        metrics::counter!("withdraw_requests_total").increment(1);
        let saga_start = std::time::Instant::now();

        let program = self
            .programs
            .get_program(program_id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("program {program_id} not found")))?;

        if program.client_id() != Some(client_id) {
            return Err(OrchestratorError::Authentication(
                "program belongs to another client".to_string(),
            ));
        }
        if program.status() != ProgramStatus::Deployed {
            return Err(OrchestratorError::Conflict(
                "program has no deployed token contract".to_string(),
            ));
        }

        let token = program.contract_address().cloned().ok_or_else(|| {
            OrchestratorError::Conflict("deployed program without address".to_string())
        })?;
        let client_wallet = program.client_wallet().cloned().ok_or_else(|| {
            OrchestratorError::NotFound("program has no client wallet".to_string())
        })?;
        let pix_key = program.payout_pix_key().cloned().ok_or_else(|| {
            OrchestratorError::NotFound("program has no payout destination".to_string())
        })?;
        let base_units = amount
            .to_base_units(program.decimals())
            .map_err(domain::DomainError::from)?;

        let cmd = RequestWithdraw::for_program(program_id, client_id, amount);
        let operation_id = cmd.operation_id;
        self.operations.request_withdraw(cmd).await?;

        // Burn leg.
        let burn_tx = match self.ledger.burn(&token, &client_wallet, base_units).await {
            Ok(tx) => tx,
            Err(e) => {
                return self.record_burn_failure(operation_id, e.to_string()).await;
            }
        };

        self.operations
            .record_burn_submission(RecordBurnSubmission::new(operation_id, burn_tx.clone()))
            .await?;

        match self.ledger.await_confirmation(&burn_tx).await {
            Ok(confirmation) if confirmation.success => {
                self.operations
                    .record_burned(RecordTokensBurned::new(operation_id, burn_tx.clone()))
                    .await?;
            }
            Ok(_) => {
                return self
                    .record_burn_failure(operation_id, "burn transaction reverted".to_string())
                    .await;
            }
            Err(e) => {
                return self.record_burn_failure(operation_id, e.to_string()).await;
            }
        }

        // Payout leg. From here the tokens are gone; failure is a
        // partial-failure outcome, not a burn failure.
        let payout = match self
            .payment
            .create_payout(&pix_key, amount, &format!("{} withdraw", program.symbol()))
            .await
        {
            Ok(payout) => payout,
            Err(e) => {
                let message = match e {
                    PaymentError::Business(msg) | PaymentError::Transport(msg) => {
                        format!("tokens burned without a corresponding payout: {msg}")
                    }
                };
                metrics::counter!("withdraw_partial_failures").increment(1);
                tracing::error!(%operation_id, burn_tx = %burn_tx, error = %message, "payout failed after burn");

                self.operations
                    .record_payout_failure(RecordPayoutFailure::new(operation_id, message.clone()))
                    .await?;

                return Err(OrchestratorError::PartialFailure {
                    operation_id,
                    burn_tx_hash: burn_tx.as_str().to_string(),
                    message,
                });
            }
        };

        let result = self
            .operations
            .record_payout_initiated(RecordPayoutInitiated::new(
                operation_id,
                payout.provider_id.clone(),
            ))
            .await?;

        metrics::histogram!("withdraw_saga_duration_seconds")
            .record(saga_start.elapsed().as_secs_f64());
        tracing::info!(%operation_id, payout_id = %payout.provider_id, "withdraw payout initiated");

        Ok(WithdrawReceipt {
            operation_id,
            payout_id: payout.provider_id,
            burn_tx_hash: burn_tx,
            status: result.aggregate.status(),
        })
    }

    async fn record_burn_failure(
        &self,
        operation_id: AggregateId,
        message: String,
    ) -> Result<WithdrawReceipt> {
        metrics::counter!("withdraw_burn_failures").increment(1);
        tracing::warn!(%operation_id, error = %message, "burn failed");

        self.operations
            .record_burn_failure(RecordBurnFailure::new(operation_id, message.clone()))
            .await?;

        Err(OrchestratorError::LedgerFailure {
            operation_id,
            message,
        })
    }
}
