//! Stablecoin program aggregate.

use common::AggregateId;
use event_log::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::value_objects::{ClientId, PixKey, TxHash, WalletAddress};

use super::events::ProgramEvent;
use super::ProgramError;

/// Upper bound on token decimals, matching the widest common token
/// precision. Keeps base-unit conversion within the decimal range.
pub const MAX_DECIMALS: u32 = 18;

/// Status of a stablecoin program.
///
/// ```text
/// Registered ──▶ Deployed
/// ```
///
/// Deployment happens lazily on the first confirmed deposit, so a
/// program can stay Registered indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProgramStatus {
    /// Registered but with no on-ledger contract yet.
    #[default]
    Registered,

    /// The token contract exists on the ledger.
    Deployed,
}

impl ProgramStatus {
    /// Returns the status as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramStatus::Registered => "Registered",
            ProgramStatus::Deployed => "Deployed",
        }
    }
}

impl std::fmt::Display for ProgramStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stablecoin program: one client-owned token configuration.
///
/// The contract address and Deployed status only ever change together,
/// through a single `ProgramDeployed` event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StablecoinProgram {
    id: Option<AggregateId>,
    version: Version,
    client_id: Option<ClientId>,
    symbol: String,
    name: String,
    decimals: u32,
    client_wallet: Option<WalletAddress>,
    payout_pix_key: Option<PixKey>,
    webhook_url: String,
    contract_address: Option<WalletAddress>,
    deploy_tx_hash: Option<TxHash>,
    status: ProgramStatus,
}

impl Aggregate for StablecoinProgram {
    type Event = ProgramEvent;
    type Error = ProgramError;

    fn aggregate_type() -> &'static str {
        "StablecoinProgram"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            ProgramEvent::ProgramRegistered(data) => {
                self.id = Some(data.program_id);
                self.client_id = Some(data.client_id);
                self.symbol = data.symbol;
                self.name = data.name;
                self.decimals = data.decimals;
                self.client_wallet = Some(data.client_wallet);
                self.payout_pix_key = Some(data.payout_pix_key);
                self.webhook_url = data.webhook_url;
                self.status = ProgramStatus::Registered;
            }
            ProgramEvent::ProgramDeployed(data) => {
                self.contract_address = Some(data.contract_address);
                self.deploy_tx_hash = Some(data.tx_hash);
                self.status = ProgramStatus::Deployed;
            }
        }
    }
}

impl StablecoinProgram {
    /// Returns the owning client, if registered.
    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    /// Returns the ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the token name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the token decimals.
    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Returns the client's on-ledger wallet, if registered.
    pub fn client_wallet(&self) -> Option<&WalletAddress> {
        self.client_wallet.as_ref()
    }

    /// Returns the payout destination, if registered.
    pub fn payout_pix_key(&self) -> Option<&PixKey> {
        self.payout_pix_key.as_ref()
    }

    /// Returns the client notification URL.
    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Returns the contract address, if deployed.
    pub fn contract_address(&self) -> Option<&WalletAddress> {
        self.contract_address.as_ref()
    }

    /// Returns the deployment transaction hash, if deployed.
    pub fn deploy_tx_hash(&self) -> Option<&TxHash> {
        self.deploy_tx_hash.as_ref()
    }

    /// Returns the current status.
    pub fn status(&self) -> ProgramStatus {
        self.status
    }

    /// Returns true once the token contract exists on the ledger.
    pub fn is_deployed(&self) -> bool {
        self.status == ProgramStatus::Deployed
    }

    /// Registers a new program.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &self,
        program_id: AggregateId,
        client_id: ClientId,
        symbol: String,
        name: String,
        decimals: u32,
        client_wallet: WalletAddress,
        payout_pix_key: PixKey,
        webhook_url: String,
    ) -> Result<Vec<ProgramEvent>, ProgramError> {
        if self.id.is_some() {
            return Err(ProgramError::AlreadyRegistered);
        }

        let symbol = symbol.trim().to_string();
        if symbol.is_empty() {
            return Err(ProgramError::InvalidSymbol {
                reason: "symbol must not be empty",
            });
        }
        if !symbol.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ProgramError::InvalidSymbol {
                reason: "symbol must be uppercase ASCII letters",
            });
        }
        if name.trim().is_empty() {
            return Err(ProgramError::InvalidName);
        }
        if decimals > MAX_DECIMALS {
            return Err(ProgramError::InvalidDecimals { max: MAX_DECIMALS });
        }

        Ok(vec![ProgramEvent::program_registered(
            program_id,
            client_id,
            symbol,
            name,
            decimals,
            client_wallet,
            payout_pix_key,
            webhook_url,
        )])
    }

    /// Records the confirmed contract deployment.
    pub fn mark_deployed(
        &self,
        contract_address: WalletAddress,
        tx_hash: TxHash,
    ) -> Result<Vec<ProgramEvent>, ProgramError> {
        if self.status != ProgramStatus::Registered {
            return Err(ProgramError::AlreadyDeployed);
        }

        Ok(vec![ProgramEvent::program_deployed(contract_address, tx_hash)])
    }
}
