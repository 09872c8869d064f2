//! Stablecoin program domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::{ClientId, PixKey, TxHash, WalletAddress};

/// Events that can occur on a stablecoin program aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ProgramEvent {
    /// A program was registered.
    ProgramRegistered(ProgramRegisteredData),

    /// The program's token contract was deployed on the ledger.
    ProgramDeployed(ProgramDeployedData),
}

impl DomainEvent for ProgramEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProgramEvent::ProgramRegistered(_) => "ProgramRegistered",
            ProgramEvent::ProgramDeployed(_) => "ProgramDeployed",
        }
    }
}

/// Data for ProgramRegistered event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramRegisteredData {
    /// The program ID.
    pub program_id: AggregateId,

    /// The owning client.
    pub client_id: ClientId,

    /// Ticker symbol, globally unique.
    pub symbol: String,

    /// Human-readable token name.
    pub name: String,

    /// Token decimals.
    pub decimals: u32,

    /// The client's on-ledger wallet, target of mints and source of burns.
    pub client_wallet: WalletAddress,

    /// The client's payout destination.
    pub payout_pix_key: PixKey,

    /// Where the client receives operation notifications.
    pub webhook_url: String,

    /// When the program was registered.
    pub registered_at: DateTime<Utc>,
}

/// Data for ProgramDeployed event.
///
/// Address and Deployed status are set together, atomically, on the
/// first deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramDeployedData {
    /// The deployed contract address.
    pub contract_address: WalletAddress,

    /// The deployment transaction hash.
    pub tx_hash: TxHash,

    /// When the deployment was confirmed.
    pub deployed_at: DateTime<Utc>,
}

impl ProgramEvent {
    /// Creates a ProgramRegistered event.
    #[allow(clippy::too_many_arguments)]
    pub fn program_registered(
        program_id: AggregateId,
        client_id: ClientId,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: u32,
        client_wallet: WalletAddress,
        payout_pix_key: PixKey,
        webhook_url: impl Into<String>,
    ) -> Self {
        ProgramEvent::ProgramRegistered(ProgramRegisteredData {
            program_id,
            client_id,
            symbol: symbol.into(),
            name: name.into(),
            decimals,
            client_wallet,
            payout_pix_key,
            webhook_url: webhook_url.into(),
            registered_at: Utc::now(),
        })
    }

    /// Creates a ProgramDeployed event.
    pub fn program_deployed(contract_address: WalletAddress, tx_hash: TxHash) -> Self {
        ProgramEvent::ProgramDeployed(ProgramDeployedData {
            contract_address,
            tx_hash,
            deployed_at: Utc::now(),
        })
    }
}
