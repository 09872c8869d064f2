//! Operation commands.

use common::AggregateId;

use crate::command::Command;
use crate::value_objects::{Amount, ClientId, TxHash};

use super::Operation;

/// Command to create a deposit operation.
#[derive(Debug, Clone)]
pub struct RequestDeposit {
    /// The operation ID to create.
    pub operation_id: AggregateId,

    /// The program to mint against.
    pub program_id: AggregateId,

    /// The client requesting the deposit.
    pub client_id: ClientId,

    /// The fiat amount to collect.
    pub amount: Amount,
}

impl RequestDeposit {
    /// Creates a new RequestDeposit command.
    pub fn new(
        operation_id: AggregateId,
        program_id: AggregateId,
        client_id: ClientId,
        amount: Amount,
    ) -> Self {
        Self {
            operation_id,
            program_id,
            client_id,
            amount,
        }
    }

    /// Creates a RequestDeposit command with a generated operation ID.
    pub fn for_program(program_id: AggregateId, client_id: ClientId, amount: Amount) -> Self {
        Self::new(AggregateId::new(), program_id, client_id, amount)
    }
}

impl Command for RequestDeposit {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to record the provider collection on a deposit.
#[derive(Debug, Clone)]
pub struct AttachCollection {
    /// The operation to attach the collection to.
    pub operation_id: AggregateId,

    /// Provider-side collection identifier.
    pub collection_id: String,

    /// Payment code artifact for the client.
    pub pay_code: String,
}

impl AttachCollection {
    /// Creates a new AttachCollection command.
    pub fn new(
        operation_id: AggregateId,
        collection_id: impl Into<String>,
        pay_code: impl Into<String>,
    ) -> Self {
        Self {
            operation_id,
            collection_id: collection_id.into(),
            pay_code: pay_code.into(),
        }
    }
}

impl Command for AttachCollection {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to confirm the client's payment.
#[derive(Debug, Clone)]
pub struct ConfirmPayment {
    /// The operation whose payment was confirmed.
    pub operation_id: AggregateId,
}

impl ConfirmPayment {
    /// Creates a new ConfirmPayment command.
    pub fn new(operation_id: AggregateId) -> Self {
        Self { operation_id }
    }
}

impl Command for ConfirmPayment {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to start ledger minting.
#[derive(Debug, Clone)]
pub struct StartMinting {
    /// The operation to mint for.
    pub operation_id: AggregateId,

    /// Whether this deposit deploys the program contract first.
    pub first_deployment: bool,
}

impl StartMinting {
    /// Creates a new StartMinting command.
    pub fn new(operation_id: AggregateId, first_deployment: bool) -> Self {
        Self {
            operation_id,
            first_deployment,
        }
    }
}

impl Command for StartMinting {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to record a submitted mint/transfer transaction.
#[derive(Debug, Clone)]
pub struct RecordMintSubmission {
    /// The operation the transaction belongs to.
    pub operation_id: AggregateId,

    /// The submitted transaction hash.
    pub tx_hash: TxHash,
}

impl RecordMintSubmission {
    /// Creates a new RecordMintSubmission command.
    pub fn new(operation_id: AggregateId, tx_hash: TxHash) -> Self {
        Self {
            operation_id,
            tx_hash,
        }
    }
}

impl Command for RecordMintSubmission {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to record a confirmed mint.
#[derive(Debug, Clone)]
pub struct RecordMinted {
    /// The operation that was minted.
    pub operation_id: AggregateId,

    /// The confirmed transaction hash.
    pub tx_hash: TxHash,
}

impl RecordMinted {
    /// Creates a new RecordMinted command.
    pub fn new(operation_id: AggregateId, tx_hash: TxHash) -> Self {
        Self {
            operation_id,
            tx_hash,
        }
    }
}

impl Command for RecordMinted {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to record a mint failure.
#[derive(Debug, Clone)]
pub struct RecordMintFailure {
    /// The operation that failed.
    pub operation_id: AggregateId,

    /// What went wrong.
    pub error: String,
}

impl RecordMintFailure {
    /// Creates a new RecordMintFailure command.
    pub fn new(operation_id: AggregateId, error: impl Into<String>) -> Self {
        Self {
            operation_id,
            error: error.into(),
        }
    }
}

impl Command for RecordMintFailure {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to record the client notification attempt.
#[derive(Debug, Clone)]
pub struct RecordClientNotified {
    /// The operation that was notified about.
    pub operation_id: AggregateId,

    /// Whether the client webhook accepted the delivery.
    pub delivered: bool,
}

impl RecordClientNotified {
    /// Creates a new RecordClientNotified command.
    pub fn new(operation_id: AggregateId, delivered: bool) -> Self {
        Self {
            operation_id,
            delivered,
        }
    }
}

impl Command for RecordClientNotified {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to create a withdraw operation.
#[derive(Debug, Clone)]
pub struct RequestWithdraw {
    /// The operation ID to create.
    pub operation_id: AggregateId,

    /// The program to burn against.
    pub program_id: AggregateId,

    /// The client requesting the withdraw.
    pub client_id: ClientId,

    /// The amount to burn and pay out.
    pub amount: Amount,
}

impl RequestWithdraw {
    /// Creates a new RequestWithdraw command.
    pub fn new(
        operation_id: AggregateId,
        program_id: AggregateId,
        client_id: ClientId,
        amount: Amount,
    ) -> Self {
        Self {
            operation_id,
            program_id,
            client_id,
            amount,
        }
    }

    /// Creates a RequestWithdraw command with a generated operation ID.
    pub fn for_program(program_id: AggregateId, client_id: ClientId, amount: Amount) -> Self {
        Self::new(AggregateId::new(), program_id, client_id, amount)
    }
}

impl Command for RequestWithdraw {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to record a submitted burn transaction.
#[derive(Debug, Clone)]
pub struct RecordBurnSubmission {
    /// The operation the transaction belongs to.
    pub operation_id: AggregateId,

    /// The submitted transaction hash.
    pub tx_hash: TxHash,
}

impl RecordBurnSubmission {
    /// Creates a new RecordBurnSubmission command.
    pub fn new(operation_id: AggregateId, tx_hash: TxHash) -> Self {
        Self {
            operation_id,
            tx_hash,
        }
    }
}

impl Command for RecordBurnSubmission {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to record a confirmed burn.
#[derive(Debug, Clone)]
pub struct RecordTokensBurned {
    /// The operation whose tokens were burned.
    pub operation_id: AggregateId,

    /// The confirmed transaction hash.
    pub tx_hash: TxHash,
}

impl RecordTokensBurned {
    /// Creates a new RecordTokensBurned command.
    pub fn new(operation_id: AggregateId, tx_hash: TxHash) -> Self {
        Self {
            operation_id,
            tx_hash,
        }
    }
}

impl Command for RecordTokensBurned {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to record a burn failure.
#[derive(Debug, Clone)]
pub struct RecordBurnFailure {
    /// The operation that failed.
    pub operation_id: AggregateId,

    /// What went wrong.
    pub error: String,
}

impl RecordBurnFailure {
    /// Creates a new RecordBurnFailure command.
    pub fn new(operation_id: AggregateId, error: impl Into<String>) -> Self {
        Self {
            operation_id,
            error: error.into(),
        }
    }
}

impl Command for RecordBurnFailure {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to record an accepted payout.
#[derive(Debug, Clone)]
pub struct RecordPayoutInitiated {
    /// The operation the payout belongs to.
    pub operation_id: AggregateId,

    /// Provider-side payout identifier.
    pub payout_id: String,
}

impl RecordPayoutInitiated {
    /// Creates a new RecordPayoutInitiated command.
    pub fn new(operation_id: AggregateId, payout_id: impl Into<String>) -> Self {
        Self {
            operation_id,
            payout_id: payout_id.into(),
        }
    }
}

impl Command for RecordPayoutInitiated {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to record a payout failure after a successful burn.
#[derive(Debug, Clone)]
pub struct RecordPayoutFailure {
    /// The operation that failed.
    pub operation_id: AggregateId,

    /// What went wrong.
    pub error: String,
}

impl RecordPayoutFailure {
    /// Creates a new RecordPayoutFailure command.
    pub fn new(operation_id: AggregateId, error: impl Into<String>) -> Self {
        Self {
            operation_id,
            error: error.into(),
        }
    }
}

impl Command for RecordPayoutFailure {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}

/// Command to complete a withdraw after payout confirmation.
#[derive(Debug, Clone)]
pub struct CompleteWithdraw {
    /// The operation to complete.
    pub operation_id: AggregateId,
}

impl CompleteWithdraw {
    /// Creates a new CompleteWithdraw command.
    pub fn new(operation_id: AggregateId) -> Self {
        Self { operation_id }
    }
}

impl Command for CompleteWithdraw {
    type Aggregate = Operation;

    fn aggregate_id(&self) -> AggregateId {
        self.operation_id
    }
}
