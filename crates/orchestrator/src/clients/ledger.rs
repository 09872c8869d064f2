//! Ledger client trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{TxHash, WalletAddress};
use thiserror::Error;

/// Errors from the ledger collaborator.
///
/// Submission errors and failed confirmations are both failure outcomes
/// for the step that issued the transaction.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The node rejected the transaction at submission.
    #[error("Ledger submission failed: {0}")]
    Submission(String),

    /// The node was unreachable.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Result of a successful contract deployment.
#[derive(Debug, Clone)]
pub struct DeployedContract {
    /// The new contract address.
    pub address: WalletAddress,

    /// The deployment transaction hash.
    pub tx_hash: TxHash,
}

/// Outcome of waiting for a transaction confirmation.
#[derive(Debug, Clone)]
pub struct Confirmation {
    /// Whether the transaction succeeded on the ledger.
    pub success: bool,

    /// The block the transaction landed in, when known.
    pub block_number: Option<u64>,
}

/// Trait for on-ledger token operations.
///
/// Amounts are integer base units; decimal-to-base-unit conversion
/// happens before the call, never inside the client.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Deploys a token contract, minting `initial_amount` base units to
    /// the initial recipient.
    async fn deploy(
        &self,
        name: &str,
        symbol: &str,
        decimals: u32,
        initial_recipient: &WalletAddress,
        initial_amount: u128,
    ) -> Result<DeployedContract, LedgerError>;

    /// Mints base units to an address.
    async fn mint(
        &self,
        token: &WalletAddress,
        to: &WalletAddress,
        amount: u128,
    ) -> Result<TxHash, LedgerError>;

    /// Transfers base units from the treasury to an address.
    async fn transfer(
        &self,
        token: &WalletAddress,
        to: &WalletAddress,
        amount: u128,
    ) -> Result<TxHash, LedgerError>;

    /// Burns base units from an address.
    async fn burn(
        &self,
        token: &WalletAddress,
        from: &WalletAddress,
        amount: u128,
    ) -> Result<TxHash, LedgerError>;

    /// Waits for a submitted transaction to confirm.
    async fn await_confirmation(&self, tx_hash: &TxHash) -> Result<Confirmation, LedgerError>;
}

#[derive(Debug, Default)]
struct InMemoryLedgerState {
    balances: HashMap<(String, String), u128>,
    next_tx: u32,
    deploy_count: u32,
    transfer_count: u32,
    burn_count: u32,
    fail_on_deploy: bool,
    fail_on_transfer: bool,
    fail_on_burn: bool,
    fail_confirmation: bool,
}

impl InMemoryLedgerState {
    fn next_tx_hash(&mut self) -> TxHash {
        self.next_tx += 1;
        TxHash::new(format!("0xtx{:04}", self.next_tx))
    }
}

/// In-memory ledger for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<InMemoryLedgerState>>,
}

impl InMemoryLedger {
    /// Creates a new in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the ledger to fail deployment submissions.
    pub fn set_fail_on_deploy(&self, fail: bool) {
        self.state.write().unwrap().fail_on_deploy = fail;
    }

    /// Configures the ledger to fail transfer submissions.
    pub fn set_fail_on_transfer(&self, fail: bool) {
        self.state.write().unwrap().fail_on_transfer = fail;
    }

    /// Configures the ledger to fail burn submissions.
    pub fn set_fail_on_burn(&self, fail: bool) {
        self.state.write().unwrap().fail_on_burn = fail;
    }

    /// Configures confirmations to come back unsuccessful.
    pub fn set_fail_confirmation(&self, fail: bool) {
        self.state.write().unwrap().fail_confirmation = fail;
    }

    /// Returns the number of deployed contracts.
    pub fn deploy_count(&self) -> u32 {
        self.state.read().unwrap().deploy_count
    }

    /// Returns the number of executed transfers.
    pub fn transfer_count(&self) -> u32 {
        self.state.read().unwrap().transfer_count
    }

    /// Returns the number of executed burns.
    pub fn burn_count(&self) -> u32 {
        self.state.read().unwrap().burn_count
    }

    /// Returns the base-unit balance of an address on a token.
    pub fn balance(&self, token: &WalletAddress, owner: &WalletAddress) -> u128 {
        self.state
            .read()
            .unwrap()
            .balances
            .get(&(token.as_str().to_string(), owner.as_str().to_string()))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn deploy(
        &self,
        _name: &str,
        symbol: &str,
        _decimals: u32,
        initial_recipient: &WalletAddress,
        initial_amount: u128,
    ) -> Result<DeployedContract, LedgerError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_deploy {
            return Err(LedgerError::Submission("deploy reverted".to_string()));
        }

        state.deploy_count += 1;
        let address = WalletAddress::new(format!("0x{}-{:02}", symbol.to_lowercase(), state.deploy_count));
        let tx_hash = state.next_tx_hash();
        if initial_amount > 0 {
            state.balances.insert(
                (
                    address.as_str().to_string(),
                    initial_recipient.as_str().to_string(),
                ),
                initial_amount,
            );
        }

        Ok(DeployedContract { address, tx_hash })
    }

    async fn mint(
        &self,
        token: &WalletAddress,
        to: &WalletAddress,
        amount: u128,
    ) -> Result<TxHash, LedgerError> {
        let mut state = self.state.write().unwrap();
        let key = (token.as_str().to_string(), to.as_str().to_string());
        *state.balances.entry(key).or_insert(0) += amount;
        Ok(state.next_tx_hash())
    }

    async fn transfer(
        &self,
        token: &WalletAddress,
        to: &WalletAddress,
        amount: u128,
    ) -> Result<TxHash, LedgerError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_transfer {
            return Err(LedgerError::Submission("transfer reverted".to_string()));
        }

        state.transfer_count += 1;
        let key = (token.as_str().to_string(), to.as_str().to_string());
        *state.balances.entry(key).or_insert(0) += amount;
        Ok(state.next_tx_hash())
    }

    async fn burn(
        &self,
        token: &WalletAddress,
        from: &WalletAddress,
        amount: u128,
    ) -> Result<TxHash, LedgerError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_burn {
            return Err(LedgerError::Submission("burn reverted".to_string()));
        }

        state.burn_count += 1;
        let key = (token.as_str().to_string(), from.as_str().to_string());
        let balance = state.balances.entry(key).or_insert(0);
        *balance = balance.saturating_sub(amount);
        Ok(state.next_tx_hash())
    }

    async fn await_confirmation(&self, _tx_hash: &TxHash) -> Result<Confirmation, LedgerError> {
        let state = self.state.read().unwrap();
        Ok(Confirmation {
            success: !state.fail_confirmation,
            block_number: Some(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deploy_and_transfer() {
        let ledger = InMemoryLedger::new();
        let treasury = WalletAddress::new("0xtreasury");
        let client = WalletAddress::new("0xclient");

        let contract = ledger
            .deploy("Brazilian Real X", "BRLX", 6, &treasury, 0)
            .await
            .unwrap();
        assert_eq!(ledger.deploy_count(), 1);

        let tx = ledger
            .transfer(&contract.address, &client, 100_000_000)
            .await
            .unwrap();
        let confirmation = ledger.await_confirmation(&tx).await.unwrap();
        assert!(confirmation.success);
        assert_eq!(ledger.balance(&contract.address, &client), 100_000_000);
    }

    #[tokio::test]
    async fn test_burn_reduces_balance() {
        let ledger = InMemoryLedger::new();
        let treasury = WalletAddress::new("0xtreasury");
        let client = WalletAddress::new("0xclient");

        let contract = ledger
            .deploy("Brazilian Real X", "BRLX", 6, &treasury, 0)
            .await
            .unwrap();
        ledger
            .transfer(&contract.address, &client, 500)
            .await
            .unwrap();
        ledger.burn(&contract.address, &client, 200).await.unwrap();

        assert_eq!(ledger.balance(&contract.address, &client), 300);
        assert_eq!(ledger.burn_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let ledger = InMemoryLedger::new();
        let treasury = WalletAddress::new("0xtreasury");

        ledger.set_fail_on_deploy(true);
        let result = ledger
            .deploy("Brazilian Real X", "BRLX", 6, &treasury, 0)
            .await;
        assert!(matches!(result, Err(LedgerError::Submission(_))));
        assert_eq!(ledger.deploy_count(), 0);

        ledger.set_fail_on_deploy(false);
        ledger.set_fail_confirmation(true);
        let contract = ledger
            .deploy("Brazilian Real X", "BRLX", 6, &treasury, 0)
            .await
            .unwrap();
        let confirmation = ledger.await_confirmation(&contract.tx_hash).await.unwrap();
        assert!(!confirmation.success);
    }
}
