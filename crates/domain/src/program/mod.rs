//! Stablecoin program aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;

pub use aggregate::{MAX_DECIMALS, ProgramStatus, StablecoinProgram};
pub use commands::{MarkDeployed, RegisterProgram};
pub use events::{ProgramDeployedData, ProgramEvent, ProgramRegisteredData};
pub use service::ProgramService;

use thiserror::Error;

/// Errors that can occur during program transitions.
#[derive(Debug, Error)]
pub enum ProgramError {
    /// The program aggregate already has a registration event.
    #[error("Program already registered")]
    AlreadyRegistered,

    /// The symbol failed validation.
    #[error("Invalid symbol: {reason}")]
    InvalidSymbol { reason: &'static str },

    /// The token name is empty.
    #[error("Token name must not be empty")]
    InvalidName,

    /// The token decimals exceed the supported range.
    #[error("Token decimals must be at most {max}")]
    InvalidDecimals { max: u32 },

    /// The contract address is already set.
    #[error("Program already deployed")]
    AlreadyDeployed,
}
