//! Stablecoin program commands.

use common::AggregateId;

use crate::command::Command;
use crate::value_objects::{ClientId, PixKey, TxHash, WalletAddress};

use super::StablecoinProgram;

/// Command to register a stablecoin program.
#[derive(Debug, Clone)]
pub struct RegisterProgram {
    /// The program ID to create.
    pub program_id: AggregateId,

    /// The owning client.
    pub client_id: ClientId,

    /// Ticker symbol, globally unique.
    pub symbol: String,

    /// Human-readable token name.
    pub name: String,

    /// Token decimals.
    pub decimals: u32,

    /// The client's on-ledger wallet.
    pub client_wallet: WalletAddress,

    /// The client's payout destination.
    pub payout_pix_key: PixKey,

    /// Where the client receives operation notifications.
    pub webhook_url: String,
}

impl RegisterProgram {
    /// Creates a new RegisterProgram command with a generated program ID.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client_id: ClientId,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: u32,
        client_wallet: WalletAddress,
        payout_pix_key: PixKey,
        webhook_url: impl Into<String>,
    ) -> Self {
        Self {
            program_id: AggregateId::new(),
            client_id,
            symbol: symbol.into(),
            name: name.into(),
            decimals,
            client_wallet,
            payout_pix_key,
            webhook_url: webhook_url.into(),
        }
    }
}

impl Command for RegisterProgram {
    type Aggregate = StablecoinProgram;

    fn aggregate_id(&self) -> AggregateId {
        self.program_id
    }
}

/// Command to record a confirmed contract deployment.
#[derive(Debug, Clone)]
pub struct MarkDeployed {
    /// The program that was deployed.
    pub program_id: AggregateId,

    /// The deployed contract address.
    pub contract_address: WalletAddress,

    /// The deployment transaction hash.
    pub tx_hash: TxHash,
}

impl MarkDeployed {
    /// Creates a new MarkDeployed command.
    pub fn new(program_id: AggregateId, contract_address: WalletAddress, tx_hash: TxHash) -> Self {
        Self {
            program_id,
            contract_address,
            tx_hash,
        }
    }
}

impl Command for MarkDeployed {
    type Aggregate = StablecoinProgram;

    fn aggregate_id(&self) -> AggregateId {
        self.program_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_program_command() {
        let client_id = ClientId::new();
        let cmd = RegisterProgram::new(
            client_id,
            "BRLX",
            "Brazilian Real X",
            6,
            WalletAddress::new("0xclient"),
            PixKey::new("treasury@bank.example"),
            "https://client.example/webhook",
        );
        assert_eq!(cmd.aggregate_id(), cmd.program_id);
        assert_eq!(cmd.client_id, client_id);
        assert_eq!(cmd.symbol, "BRLX");
    }

    #[test]
    fn test_mark_deployed_command() {
        let program_id = AggregateId::new();
        let cmd = MarkDeployed::new(
            program_id,
            WalletAddress::new("0xcontract"),
            TxHash::new("0xdeploy"),
        );
        assert_eq!(cmd.aggregate_id(), program_id);
        assert_eq!(cmd.contract_address.as_str(), "0xcontract");
    }
}
