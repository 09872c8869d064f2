//! Deposit saga: fiat in, tokens minted out.
//!
//! `PaymentPending → PaymentDeposited → MintingInProgress →
//! {Minted | MintFailed}`, then `Minted → ClientNotified`.

use common::AggregateId;
use domain::operation::{
    AttachCollection, OperationStatus, RecordClientNotified, RecordMintFailure,
    RecordMintSubmission, RecordMinted, RequestDeposit, StartMinting,
};
use domain::{Aggregate, Amount, ClientId, MarkDeployed, StablecoinProgram, WalletAddress};
use event_log::EventLog;

use crate::clients::{
    AuthProvider, LedgerClient, NotificationPayload, Notifier, PaymentClient, PaymentError,
};
use crate::coordinator::Orchestrator;
use crate::error::{OrchestratorError, Result};

/// What a caller gets back from a deposit request.
#[derive(Debug, Clone)]
pub struct DepositReceipt {
    /// The new operation.
    pub operation_id: AggregateId,

    /// Payment code artifact the end customer pays.
    pub pay_code: String,

    /// Operation status after the request (`PaymentPending`).
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
    /// Creates a deposit operation and its provider collection.
    ///
    /// The operation id doubles as the idempotency key: it is sent to
    /// the provider as the external reference and echoed back in the
    /// confirmation webhook.
    #[tracing::instrument(skip(self))]
    pub async fn request_deposit(
        &self,
        client_id: ClientId,
        program_id: AggregateId,
        amount: Amount,
    ) -> Result<DepositReceipt> {
        metrics::counter!("deposit_requests_total").increment(1);

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

        // Sub-unit residue is rejected up front, before any side effect.
        amount
            .to_base_units(program.decimals())
            .map_err(domain::DomainError::from)?;

        let cmd = RequestDeposit::for_program(program_id, client_id, amount);
        let operation_id = cmd.operation_id;
        self.operations.request_deposit(cmd).await?;

        let collection = self
            .payment
            .create_collection(
                amount,
                &operation_id.to_string(),
                &format!("{} deposit", program.symbol()),
            )
            .await
            .map_err(|e| match e {
                PaymentError::Business(msg) => OrchestratorError::ExternalBusiness(msg),
                PaymentError::Transport(msg) => OrchestratorError::ExternalTransient(msg),
            })?;

        let result = self
            .operations
            .attach_collection(AttachCollection::new(
                operation_id,
                collection.provider_id,
                collection.pay_code.clone(),
            ))
            .await?;

        tracing::info!(%operation_id, %program_id, "deposit requested");

        Ok(DepositReceipt {
            operation_id,
            pay_code: collection.pay_code,
            status: result.aggregate.status(),
        })
    }

    /// Runs the mint leg of the deposit saga after payment confirmation.
    ///
    /// Every failure is recorded on the operation as `MintFailed` and
    /// the saga ends; webhook redelivery never retries a recorded
    /// outcome.
    #[tracing::instrument(skip(self))]
    pub(crate) async fn run_mint_saga(&self, operation_id: AggregateId) -> Result<()> {
        metrics::counter!("deposit_mint_sagas_total").increment(1);
        let saga_start = std::time::Instant::now();

        let operation = self
            .operations
            .get_operation(operation_id)
            .await?
            .ok_or_else(|| {
                OrchestratorError::NotFound(format!("operation {operation_id} not found"))
            })?;
        let program = self.program_for(&operation).await?;

        let first_deployment = !program.is_deployed();
        if self
            .ignore_stale(
                self.operations
                    .start_minting(StartMinting::new(operation_id, first_deployment))
                    .await,
            )?
            .is_none()
        {
            tracing::info!(%operation_id, "minting already started, ignoring");
            return Ok(());
        }

        let amount = operation.amount().ok_or_else(|| {
            OrchestratorError::NotFound(format!("operation {operation_id} has no amount"))
        })?;
        let base_units = match amount.to_base_units(program.decimals()) {
            Ok(units) => units,
            Err(e) => {
                self.record_mint_failure(operation_id, e.to_string()).await?;
                return Ok(());
            }
        };

        // Deploy on the very first deposit for this program.
        let token = if first_deployment {
            match self.deploy_program(&program).await {
                Ok(address) => address,
                Err(message) => {
                    self.record_mint_failure(operation_id, message).await?;
                    return Ok(());
                }
            }
        } else {
            program
                .contract_address()
                .cloned()
                .ok_or_else(|| {
                    OrchestratorError::Conflict("deployed program without address".to_string())
                })?
        };

        let client_wallet = program.client_wallet().cloned().ok_or_else(|| {
            OrchestratorError::NotFound("program has no client wallet".to_string())
        })?;

        let tx_hash = match self.ledger.transfer(&token, &client_wallet, base_units).await {
            Ok(tx) => tx,
            Err(e) => {
                self.record_mint_failure(operation_id, e.to_string()).await?;
                return Ok(());
            }
        };

        // Persist the handle before the wait; a crash here resumes by
        // re-checking confirmation rather than resubmitting.
        self.operations
            .record_mint_submission(RecordMintSubmission::new(operation_id, tx_hash.clone()))
            .await?;

        match self.ledger.await_confirmation(&tx_hash).await {
            Ok(confirmation) if confirmation.success => {
                self.operations
                    .record_minted(RecordMinted::new(operation_id, tx_hash.clone()))
                    .await?;
            }
            Ok(_) => {
                self.record_mint_failure(operation_id, "mint transaction reverted".to_string())
                    .await?;
                return Ok(());
            }
            Err(e) => {
                self.record_mint_failure(operation_id, e.to_string()).await?;
                return Ok(());
            }
        }

        // Success path only: best-effort notification, then terminal.
        let payload = NotificationPayload {
            operation_id,
            event: "deposit.minted".to_string(),
            amount: amount.as_decimal(),
            tx_hash: Some(tx_hash.as_str().to_string()),
            burn_tx_hash: None,
            stablecoin_address: Some(token.as_str().to_string()),
            pix_address: None,
            first_deployment: Some(first_deployment),
            timestamp: chrono::Utc::now(),
        };
        let delivered = self
            .notify_best_effort(program.webhook_url(), &payload)
            .await;

        self.operations
            .record_notified(RecordClientNotified::new(operation_id, delivered))
            .await?;

        metrics::counter!("deposit_minted").increment(1);
        metrics::histogram!("deposit_mint_saga_duration_seconds")
            .record(saga_start.elapsed().as_secs_f64());
        tracing::info!(%operation_id, first_deployment, "deposit minted");

        Ok(())
    }

    /// Deploys the token contract and flips the program to Deployed.
    /// Returns the contract address, or a failure message for the
    /// operation record.
    async fn deploy_program(
        &self,
        program: &StablecoinProgram,
    ) -> std::result::Result<WalletAddress, String> {
        let contract = self
            .ledger
            .deploy(
                program.name(),
                program.symbol(),
                program.decimals(),
                &self.config.treasury_wallet,
                0,
            )
            .await
            .map_err(|e| e.to_string())?;

        let confirmation = self
            .ledger
            .await_confirmation(&contract.tx_hash)
            .await
            .map_err(|e| e.to_string())?;
        if !confirmation.success {
            return Err("deployment transaction reverted".to_string());
        }

        let program_id = program
            .id()
            .ok_or_else(|| "program has no id".to_string())?;
        match self
            .programs
            .mark_deployed(MarkDeployed::new(
                program_id,
                contract.address.clone(),
                contract.tx_hash,
            ))
            .await
        {
            Ok(_) => Ok(contract.address),
            // A racer deployed first; its address is the real one.
            Err(e) if e.is_stale_state() || matches!(e, domain::DomainError::Program(_)) => {
                let current = self
                    .programs
                    .get_program(program_id)
                    .await
                    .map_err(|err| err.to_string())?
                    .ok_or_else(|| "program vanished during deployment".to_string())?;
                current
                    .contract_address()
                    .cloned()
                    .ok_or_else(|| "program not deployed after race".to_string())
            }
            Err(e) => Err(e.to_string()),
        }
    }

    async fn record_mint_failure(&self, operation_id: AggregateId, message: String) -> Result<()> {
        metrics::counter!("deposit_mint_failures").increment(1);
        tracing::warn!(%operation_id, error = %message, "mint failed");
        self.operations
            .record_mint_failure(RecordMintFailure::new(operation_id, message))
            .await?;
        Ok(())
    }
}
