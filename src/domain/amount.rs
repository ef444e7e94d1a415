//! Amount type
//!
//! Domain primitives for monetary values in integer minor units.
//! Amounts are validated at construction time, so a transfer can never
//! carry a zero or negative value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum value a single amount or balance may hold (minor units)
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Amount represents a validated, strictly positive monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Maximum value is `MAX_AMOUNT`
///
/// # Example
/// ```
/// use bank_api::domain::Amount;
///
/// let amount = Amount::new(100).unwrap();
/// assert_eq!(amount.value(), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

/// Errors that can occur when creating an Amount or adjusting a Balance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(i64),

    #[error("Amount exceeds maximum allowed value ({MAX_AMOUNT})")]
    Overflow,

    #[error("Balance cannot become negative (available {available}, requested {requested})")]
    Insufficient { available: i64, requested: i64 },
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    /// - `AmountError::Overflow` if value > `MAX_AMOUNT`
    pub fn new(value: i64) -> Result<Self, AmountError> {
        if value <= 0 {
            return Err(AmountError::NotPositive(value));
        }
        if value > MAX_AMOUNT {
            return Err(AmountError::Overflow);
        }
        Ok(Self(value))
    }

    /// Get the underlying minor-unit value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Signed delta that removes this amount from a balance.
    pub fn as_debit(&self) -> i64 {
        -self.0
    }

    /// Signed delta that adds this amount to a balance.
    pub fn as_credit(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Amount {
    type Error = AmountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Balance represents an account balance (zero or positive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(i64);

impl Balance {
    /// Create a new balance (zero or positive).
    ///
    /// Unlike `Amount`, a balance is only bounded by the `i64` column it is stored in.
    pub fn new(value: i64) -> Result<Self, AmountError> {
        if value < 0 {
            return Err(AmountError::NotPositive(value));
        }
        Ok(Self(value))
    }

    /// Create a zero balance
    pub fn zero() -> Self {
        Self(0)
    }

    /// Get the underlying value
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Check if balance is sufficient for withdrawal
    pub fn is_sufficient_for(&self, amount: &Amount) -> bool {
        self.0 >= amount.value()
    }

    /// Apply a signed delta, refusing to go below zero or past `i64::MAX`.
    pub fn apply(&self, delta: i64) -> Result<Balance, AmountError> {
        let next = self.0.checked_add(delta).ok_or(AmountError::Overflow)?;
        if next < 0 {
            return Err(AmountError::Insufficient {
                available: self.0,
                requested: -delta,
            });
        }
        Balance::new(next)
    }

    /// Add amount to balance
    pub fn credit(&self, amount: &Amount) -> Result<Balance, AmountError> {
        self.apply(amount.as_credit())
    }

    /// Subtract amount from balance
    pub fn debit(&self, amount: &Amount) -> Result<Balance, AmountError> {
        self.apply(amount.as_debit())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
