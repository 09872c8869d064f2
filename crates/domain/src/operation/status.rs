//! Operation status state machine.

use serde::{Deserialize, Serialize};

/// The kind of an operation, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Fiat in, tokens minted to the client wallet.
    Deposit,

    /// Tokens burned, fiat paid out to the client.
    Withdraw,
}

impl OperationKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "Deposit",
            OperationKind::Withdraw => "Withdraw",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The status of an operation in its lifecycle.
///
/// Deposit transitions:
/// ```text
/// PaymentPending ──► PaymentDeposited ──► MintingInProgress ──┬──► Minted ──► ClientNotified
///                                                             └──► MintFailed
/// ```
///
/// Withdraw transitions:
/// ```text
/// BurnInitiated ──┬──► TokensBurned ──┬──► PixTransferPending ──► WithdrawSuccessful
///                 │                   └──► BurnSucceededPayoutFailed
///                 └──► BurnFailed
/// ```
///
/// Statuses only move forward; terminal statuses accept no transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OperationStatus {
    /// Deposit requested, awaiting the client's payment.
    #[default]
    PaymentPending,

    /// Payment confirmed by the provider.
    PaymentDeposited,

    /// Ledger mint/transfer is in flight.
    MintingInProgress,

    /// Tokens delivered to the client wallet.
    Minted,

    /// Ledger mint/transfer failed (terminal, operator remediation).
    MintFailed,

    /// Client webhook notified after a successful mint (terminal).
    ClientNotified,

    /// Withdraw requested, burn is in flight.
    BurnInitiated,

    /// Tokens burned, payout not yet initiated.
    TokensBurned,

    /// Ledger burn failed (terminal, no payout attempted).
    BurnFailed,

    /// Payout accepted by the provider, awaiting confirmation.
    PixTransferPending,

    /// Payout confirmed (terminal).
    WithdrawSuccessful,

    /// Tokens burned but the payout failed (terminal). Distinct from
    /// BurnFailed so reconciliation can find operations where value
    /// left the ledger without a matching payout.
    BurnSucceededPayoutFailed,
}

impl OperationStatus {
    /// Returns true if a payment confirmation can be applied.
    pub fn can_confirm_payment(&self) -> bool {
        matches!(self, OperationStatus::PaymentPending)
    }

    /// Returns true if minting can start.
    pub fn can_start_minting(&self) -> bool {
        matches!(self, OperationStatus::PaymentDeposited)
    }

    /// Returns true if a mint outcome (success or failure) can be recorded.
    pub fn can_record_mint_outcome(&self) -> bool {
        matches!(self, OperationStatus::MintingInProgress)
    }

    /// Returns true if the client notification can be recorded.
    pub fn can_record_notification(&self) -> bool {
        matches!(self, OperationStatus::Minted)
    }

    /// Returns true if a burn outcome (success or failure) can be recorded.
    pub fn can_record_burn_outcome(&self) -> bool {
        matches!(self, OperationStatus::BurnInitiated)
    }

    /// Returns true if a payout outcome (initiated or failed) can be recorded.
    pub fn can_record_payout_outcome(&self) -> bool {
        matches!(self, OperationStatus::TokensBurned)
    }

    /// Returns true if the withdraw can complete.
    pub fn can_complete_withdraw(&self) -> bool {
        matches!(self, OperationStatus::PixTransferPending)
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::MintFailed
                | OperationStatus::ClientNotified
                | OperationStatus::BurnFailed
                | OperationStatus::WithdrawSuccessful
                | OperationStatus::BurnSucceededPayoutFailed
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::PaymentPending => "PaymentPending",
            OperationStatus::PaymentDeposited => "PaymentDeposited",
            OperationStatus::MintingInProgress => "MintingInProgress",
            OperationStatus::Minted => "Minted",
            OperationStatus::MintFailed => "MintFailed",
            OperationStatus::ClientNotified => "ClientNotified",
            OperationStatus::BurnInitiated => "BurnInitiated",
            OperationStatus::TokensBurned => "TokensBurned",
            OperationStatus::BurnFailed => "BurnFailed",
            OperationStatus::PixTransferPending => "PixTransferPending",
            OperationStatus::WithdrawSuccessful => "WithdrawSuccessful",
            OperationStatus::BurnSucceededPayoutFailed => "BurnSucceededPayoutFailed",
        }
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_payment_pending_can_confirm() {
        assert!(OperationStatus::PaymentPending.can_confirm_payment());
        assert!(!OperationStatus::PaymentDeposited.can_confirm_payment());
        assert!(!OperationStatus::Minted.can_confirm_payment());
        assert!(!OperationStatus::ClientNotified.can_confirm_payment());
    }

    #[test]
    fn test_only_deposited_can_start_minting() {
        assert!(OperationStatus::PaymentDeposited.can_start_minting());
        assert!(!OperationStatus::PaymentPending.can_start_minting());
        assert!(!OperationStatus::MintingInProgress.can_start_minting());
    }

    #[test]
    fn test_mint_outcome_only_while_minting() {
        assert!(OperationStatus::MintingInProgress.can_record_mint_outcome());
        assert!(!OperationStatus::Minted.can_record_mint_outcome());
        assert!(!OperationStatus::MintFailed.can_record_mint_outcome());
    }

    #[test]
    fn test_burn_and_payout_gates() {
        assert!(OperationStatus::BurnInitiated.can_record_burn_outcome());
        assert!(!OperationStatus::TokensBurned.can_record_burn_outcome());

        assert!(OperationStatus::TokensBurned.can_record_payout_outcome());
        assert!(!OperationStatus::PixTransferPending.can_record_payout_outcome());

        assert!(OperationStatus::PixTransferPending.can_complete_withdraw());
        assert!(!OperationStatus::WithdrawSuccessful.can_complete_withdraw());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OperationStatus::MintFailed.is_terminal());
        assert!(OperationStatus::ClientNotified.is_terminal());
        assert!(OperationStatus::BurnFailed.is_terminal());
        assert!(OperationStatus::WithdrawSuccessful.is_terminal());
        assert!(OperationStatus::BurnSucceededPayoutFailed.is_terminal());

        assert!(!OperationStatus::PaymentPending.is_terminal());
        assert!(!OperationStatus::TokensBurned.is_terminal());
        assert!(!OperationStatus::PixTransferPending.is_terminal());
    }

    #[test]
    fn test_partial_failure_distinct_from_burn_failed() {
        assert_ne!(
            OperationStatus::BurnSucceededPayoutFailed,
            OperationStatus::BurnFailed
        );
        assert_ne!(
            OperationStatus::BurnSucceededPayoutFailed,
            OperationStatus::WithdrawSuccessful
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(OperationStatus::PaymentPending.to_string(), "PaymentPending");
        assert_eq!(
            OperationStatus::BurnSucceededPayoutFailed.to_string(),
            "BurnSucceededPayoutFailed"
        );
    }

    #[test]
    fn test_serialization() {
        let status = OperationStatus::PixTransferPending;
        let json = serde_json::to_string(&status).unwrap();
        let deserialized: OperationStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, deserialized);
    }
}
