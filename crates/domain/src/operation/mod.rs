//! Operation aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod status;

pub use aggregate::Operation;
pub use commands::*;
pub use events::{
    BurnFailedData, BurnSubmittedData, ClientNotifiedData, CollectionCreatedData,
    DepositRequestedData, MintFailedData, MintSubmittedData, MintedData, MintingStartedData,
    OperationEvent, PaymentConfirmedData, PayoutFailedData, PayoutInitiatedData, TokensBurnedData,
    WithdrawCompletedData, WithdrawRequestedData,
};
pub use service::OperationService;
pub use status::{OperationKind, OperationStatus};

use thiserror::Error;

/// Errors that can occur during operation transitions.
#[derive(Debug, Error)]
pub enum OperationError {
    /// The operation is not in a status that allows this transition.
    /// Sagas treat this as "a competing delivery already handled it".
    #[error("Invalid state transition: cannot {action} from {current_status} status")]
    InvalidStateTransition {
        current_status: OperationStatus,
        action: &'static str,
    },

    /// Operation is already created.
    #[error("Operation already created")]
    AlreadyCreated,
}
