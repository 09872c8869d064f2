//! Operation orchestrator for the stablemint backend.
//!
//! Turns inbound payment-provider webhooks and withdrawal requests into
//! ledger mints/burns, off-chain payouts, and client notifications,
//! while keeping a consistent operation record under partial failure
//! and duplicate delivery.
//!
//! The deposit saga: collect fiat, mint tokens, notify the client. The
//! withdraw saga: burn tokens, pay out fiat. Both record every outcome
//! on the event-sourced operation; a failure after the burn gets its
//! own `BurnSucceededPayoutFailed` status so reconciliation can find it.

pub mod clients;
pub mod config;
pub mod coordinator;
pub mod deposit;
pub mod error;
pub mod guard;
pub mod webhook;
pub mod withdraw;

pub use clients::{
    AuthProvider, Confirmation, DeployedContract, InMemoryAuthProvider, InMemoryLedger,
    InMemoryNotifier, InMemoryPaymentProvider, LedgerClient, LedgerError, NotificationPayload,
    Notifier, NotifierError, PaymentClient, PaymentError,
};
pub use config::OrchestratorConfig;
pub use coordinator::Orchestrator;
pub use deposit::DepositReceipt;
pub use error::{OrchestratorError, Result};
pub use webhook::{PaymentConfirmedData, PayoutConfirmedData, RawDelivery};
pub use withdraw::WithdrawReceipt;
