//! Orchestrator configuration.

use domain::WalletAddress;

/// Configuration for the operation orchestrator.
///
/// Built once at startup and injected; business logic never reads the
/// environment directly.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Treasury wallet holding the deployed token supply.
    pub treasury_wallet: WalletAddress,

    /// Shared secret for payment-provider webhook signatures.
    pub webhook_secret: String,
}

impl OrchestratorConfig {
    /// Creates a new configuration.
    pub fn new(treasury_wallet: WalletAddress, webhook_secret: impl Into<String>) -> Self {
        Self {
            treasury_wallet,
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Reads configuration from the environment.
    ///
    /// `TREASURY_WALLET` and `WEBHOOK_SECRET` are required.
    pub fn from_env() -> Option<Self> {
        let treasury_wallet = std::env::var("TREASURY_WALLET").ok()?;
        let webhook_secret = std::env::var("WEBHOOK_SECRET").ok()?;
        Some(Self::new(WalletAddress::new(treasury_wallet), webhook_secret))
    }
}
