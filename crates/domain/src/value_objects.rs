//! Value objects shared by the operation and program aggregates.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for an API client (program owner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Creates a new random client ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a client ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ClientId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ClientId> for Uuid {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

/// Errors from amount validation and conversion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// Amount must be strictly positive.
    #[error("Invalid amount: {0} (must be greater than 0)")]
    NotPositive(Decimal),

    /// Amount has precision the token cannot represent.
    #[error("Amount {amount} has sub-unit residue at {decimals} decimals")]
    SubUnitResidue { amount: Decimal, decimals: u32 },

    /// Amount overflows the base-unit integer range.
    #[error("Amount {0} overflows the base-unit range")]
    Overflow(Decimal),
}

/// A positive fiat/token amount.
///
/// Backed by a fixed-point decimal; arithmetic never goes through
/// floating point. The amount on an operation is immutable once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Creates an amount, rejecting zero and negative values.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Converts to integer base units by shifting `decimals` places.
    ///
    /// Fails if the amount carries precision below one base unit, or if
    /// the scaled value does not fit in u128.
    pub fn to_base_units(&self, decimals: u32) -> Result<u128, AmountError> {
        let factor = 10u128
            .checked_pow(decimals)
            .and_then(Decimal::from_u128)
            .ok_or(AmountError::Overflow(self.0))?;
        let scaled = self
            .0
            .checked_mul(factor)
            .ok_or(AmountError::Overflow(self.0))?;

        if !scaled.fract().is_zero() {
            return Err(AmountError::SubUnitResidue {
                amount: self.0,
                decimals,
            });
        }

        scaled.to_u128().ok_or(AmountError::Overflow(self.0))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ledger transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    /// Creates a transaction hash from a string.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Returns the hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TxHash {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TxHash {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A ledger wallet or contract address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Creates a wallet address from a string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WalletAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An instant-payment destination key for payouts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PixKey(String);

impl PixKey {
    /// Creates a payout key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PixKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PixKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PixKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
