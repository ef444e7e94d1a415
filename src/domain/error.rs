//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Domain-specific errors
///
/// These errors represent business rule violations raised by the transfer
/// engine. They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Source balance cannot cover the transfer
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    /// Invalid amount (zero, negative, or exceeds limit)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Account could not be resolved by number
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Transfer to same account
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,
}

impl DomainError {
    /// Create an insufficient funds error
    pub fn insufficient_funds(required: i64, available: i64) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    /// Check if this is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. } | Self::InvalidAmount(_) | Self::SameAccountTransfer
        )
    }
}
