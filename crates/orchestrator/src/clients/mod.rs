//! External collaborator traits and their in-memory implementations.

pub mod auth;
pub mod ledger;
pub mod notifier;
pub mod payment;

pub use auth::{AuthProvider, InMemoryAuthProvider};
pub use ledger::{Confirmation, DeployedContract, InMemoryLedger, LedgerClient, LedgerError};
pub use notifier::{InMemoryNotifier, NotificationPayload, Notifier, NotifierError};
pub use payment::{Collection, InMemoryPaymentProvider, PaymentClient, PaymentError, Payout};
