//! Operation service: the sole write path for operation records.

use common::AggregateId;
use event_log::EventLog;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{
    AttachCollection, CompleteWithdraw, ConfirmPayment, Operation, RecordBurnFailure,
    RecordBurnSubmission, RecordClientNotified, RecordMintFailure, RecordMintSubmission,
    RecordMinted, RecordPayoutFailure, RecordPayoutInitiated, RecordTokensBurned, RequestDeposit,
    RequestWithdraw, StartMinting,
};

impl From<super::OperationError> for DomainError {
    fn from(e: super::OperationError) -> Self {
        DomainError::Operation(e)
    }
}

/// Service for managing operations.
///
/// Every method is a compare-and-transition: the aggregate is loaded,
/// the current status validated, and the events appended with the
/// loaded version as the expected version. A caller acting on stale
/// state gets `InvalidStateTransition`; a concurrent racer gets
/// `ConcurrencyConflict`. Both satisfy `DomainError::is_stale_state`.
pub struct OperationService<S: EventLog> {
    handler: CommandHandler<S, Operation>,
}

impl<S: EventLog> OperationService<S> {
    /// Creates a new operation service with the given event log.
    pub fn new(log: S) -> Self {
        Self {
            handler: CommandHandler::new(log),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Operation> {
        &self.handler
    }

    /// Creates a deposit operation in PaymentPending.
    #[tracing::instrument(skip(self))]
    pub async fn request_deposit(
        &self,
        cmd: RequestDeposit,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let RequestDeposit {
            operation_id,
            program_id,
            client_id,
            amount,
        } = cmd;

        self.handler
            .execute(operation_id, |op| {
                op.request_deposit(operation_id, program_id, client_id, amount)
            })
            .await
    }

    /// Records the provider collection reference and payment code.
    #[tracing::instrument(skip(self))]
    pub async fn attach_collection(
        &self,
        cmd: AttachCollection,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let collection_id = cmd.collection_id.clone();
        let pay_code = cmd.pay_code.clone();

        self.handler
            .execute(cmd.operation_id, |op| {
                op.attach_collection(collection_id, pay_code)
            })
            .await
    }

    /// Confirms the client's payment.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_payment(
        &self,
        cmd: ConfirmPayment,
    ) -> Result<CommandResult<Operation>, DomainError> {
        self.handler
            .execute(cmd.operation_id, |op| op.confirm_payment())
            .await
    }

    /// Starts ledger minting.
    #[tracing::instrument(skip(self))]
    pub async fn start_minting(
        &self,
        cmd: StartMinting,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let first_deployment = cmd.first_deployment;

        self.handler
            .execute(cmd.operation_id, |op| op.start_minting(first_deployment))
            .await
    }

    /// Records the submitted mint/transfer transaction hash.
    #[tracing::instrument(skip(self))]
    pub async fn record_mint_submission(
        &self,
        cmd: RecordMintSubmission,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let tx_hash = cmd.tx_hash.clone();

        self.handler
            .execute(cmd.operation_id, |op| op.record_mint_submission(tx_hash))
            .await
    }

    /// Records a confirmed mint.
    #[tracing::instrument(skip(self))]
    pub async fn record_minted(
        &self,
        cmd: RecordMinted,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let tx_hash = cmd.tx_hash.clone();

        self.handler
            .execute(cmd.operation_id, |op| op.record_minted(tx_hash))
            .await
    }

    /// Records a mint failure.
    #[tracing::instrument(skip(self))]
    pub async fn record_mint_failure(
        &self,
        cmd: RecordMintFailure,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let error = cmd.error.clone();

        self.handler
            .execute(cmd.operation_id, |op| op.record_mint_failure(error))
            .await
    }

    /// Records the client notification attempt.
    #[tracing::instrument(skip(self))]
    pub async fn record_notified(
        &self,
        cmd: RecordClientNotified,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let delivered = cmd.delivered;

        self.handler
            .execute(cmd.operation_id, |op| op.record_notified(delivered))
            .await
    }

    /// Creates a withdraw operation in BurnInitiated.
    #[tracing::instrument(skip(self))]
    pub async fn request_withdraw(
        &self,
        cmd: RequestWithdraw,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let RequestWithdraw {
            operation_id,
            program_id,
            client_id,
            amount,
        } = cmd;

        self.handler
            .execute(operation_id, |op| {
                op.request_withdraw(operation_id, program_id, client_id, amount)
            })
            .await
    }

    /// Records the submitted burn transaction hash.
    #[tracing::instrument(skip(self))]
    pub async fn record_burn_submission(
        &self,
        cmd: RecordBurnSubmission,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let tx_hash = cmd.tx_hash.clone();

        self.handler
            .execute(cmd.operation_id, |op| op.record_burn_submission(tx_hash))
            .await
    }

    /// Records a confirmed burn.
    #[tracing::instrument(skip(self))]
    pub async fn record_burned(
        &self,
        cmd: RecordTokensBurned,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let tx_hash = cmd.tx_hash.clone();

        self.handler
            .execute(cmd.operation_id, |op| op.record_burned(tx_hash))
            .await
    }

    /// Records a burn failure.
    #[tracing::instrument(skip(self))]
    pub async fn record_burn_failure(
        &self,
        cmd: RecordBurnFailure,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let error = cmd.error.clone();

        self.handler
            .execute(cmd.operation_id, |op| op.record_burn_failure(error))
            .await
    }

    /// Records an accepted payout.
    #[tracing::instrument(skip(self))]
    pub async fn record_payout_initiated(
        &self,
        cmd: RecordPayoutInitiated,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let payout_id = cmd.payout_id.clone();

        self.handler
            .execute(cmd.operation_id, |op| op.record_payout_initiated(payout_id))
            .await
    }

    /// Records a payout failure after a successful burn.
    #[tracing::instrument(skip(self))]
    pub async fn record_payout_failure(
        &self,
        cmd: RecordPayoutFailure,
    ) -> Result<CommandResult<Operation>, DomainError> {
        let error = cmd.error.clone();

        self.handler
            .execute(cmd.operation_id, |op| op.record_payout_failure(error))
            .await
    }

    /// Completes a withdraw after payout confirmation.
    #[tracing::instrument(skip(self))]
    pub async fn complete_withdraw(
        &self,
        cmd: CompleteWithdraw,
    ) -> Result<CommandResult<Operation>, DomainError> {
        self.handler
            .execute(cmd.operation_id, |op| op.complete_withdraw())
            .await
    }

    /// Loads an operation by ID.
    ///
    /// Returns None if the operation doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_operation(
        &self,
        operation_id: AggregateId,
    ) -> Result<Option<Operation>, DomainError> {
        self.handler.load_existing(operation_id).await
    }
}
