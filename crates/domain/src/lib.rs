//! Domain layer for the stablecoin issuance backend.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for event-sourced entities
//! - DomainEvent trait for domain events
//! - Command trait and CommandHandler for command processing
//! - Operation aggregate: the deposit/withdraw state machine
//! - StablecoinProgram aggregate: the issuance program registry

pub mod aggregate;
pub mod command;
pub mod error;
pub mod operation;
pub mod program;
pub mod value_objects;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::DomainError;
pub use operation::{
    Operation, OperationError, OperationEvent, OperationKind, OperationService, OperationStatus,
};
pub use program::{
    MarkDeployed, ProgramError, ProgramEvent, ProgramService, ProgramStatus, RegisterProgram,
    StablecoinProgram,
};
pub use value_objects::{Amount, AmountError, ClientId, PixKey, TxHash, WalletAddress};
