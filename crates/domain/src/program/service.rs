//! Program service: registration and deployment bookkeeping.

use common::AggregateId;
use event_log::EventLog;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::events::ProgramEvent;
use super::{MarkDeployed, ProgramError, RegisterProgram, StablecoinProgram};

impl From<ProgramError> for DomainError {
    fn from(e: ProgramError) -> Self {
        DomainError::Program(e)
    }
}

/// Service for managing stablecoin programs.
pub struct ProgramService<S: EventLog> {
    handler: CommandHandler<S, StablecoinProgram>,
}

impl<S: EventLog> ProgramService<S> {
    /// Creates a new program service with the given event log.
    pub fn new(log: S) -> Self {
        Self {
            handler: CommandHandler::new(log),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, StablecoinProgram> {
        &self.handler
    }

    /// Registers a new stablecoin program.
    ///
    /// Symbols are unique across all programs. The check scans the
    /// registration history before appending; two racing registrations
    /// of the same symbol are still serialized by the version guard on
    /// their own aggregates, so the scan is best-effort and the symbol
    /// index projection is the authoritative lookup.
    #[tracing::instrument(skip(self))]
    pub async fn register_program(
        &self,
        cmd: RegisterProgram,
    ) -> Result<CommandResult<StablecoinProgram>, DomainError> {
        let symbol = cmd.symbol.trim().to_string();

        let registered = self
            .handler
            .log()
            .events_by_type("ProgramRegistered")
            .await?;
        for envelope in registered {
            // Payloads are stored as the tagged ProgramEvent enum.
            let event: ProgramEvent = serde_json::from_value(envelope.payload)?;
            if let ProgramEvent::ProgramRegistered(data) = event {
                if data.symbol == symbol {
                    return Err(DomainError::DuplicateSymbol { symbol });
                }
            }
        }

        let RegisterProgram {
            program_id,
            client_id,
            symbol,
            name,
            decimals,
            client_wallet,
            payout_pix_key,
            webhook_url,
        } = cmd;

        self.handler
            .execute(program_id, |program| {
                program.register(
                    program_id,
                    client_id,
                    symbol,
                    name,
                    decimals,
                    client_wallet,
                    payout_pix_key,
                    webhook_url,
                )
            })
            .await
    }

    /// Records the confirmed contract deployment for a program.
    #[tracing::instrument(skip(self))]
    pub async fn mark_deployed(
        &self,
        cmd: MarkDeployed,
    ) -> Result<CommandResult<StablecoinProgram>, DomainError> {
        let contract_address = cmd.contract_address.clone();
        let tx_hash = cmd.tx_hash.clone();

        self.handler
            .execute(cmd.program_id, |program| {
                program.mark_deployed(contract_address, tx_hash)
            })
            .await
    }

    /// Loads a program by ID.
    ///
    /// Returns None if the program doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_program(
        &self,
        program_id: AggregateId,
    ) -> Result<Option<StablecoinProgram>, DomainError> {
        self.handler.load_existing(program_id).await
    }
}
