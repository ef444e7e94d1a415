//! Storage Errors
//!
//! Error types for account storage operations.

use crate::domain::AccountId;

/// Unique violation
const PG_UNIQUE_VIOLATION: &str = "23505";
/// Check constraint violation (balance >= 0)
const PG_CHECK_VIOLATION: &str = "23514";
/// Numeric value out of range (BIGINT overflow)
pub(crate) const PG_NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Errors that can occur in the account store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No account matches the given id or number
    #[error("Account not found: {0}")]
    NotFound(String),

    /// Uniqueness or other integrity constraint rejected the write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Guarded balance update would have driven the balance below zero
    #[error("Balance of account {0} cannot become negative")]
    NegativeBalance(AccountId),

    /// Credit would push the balance past what the store can hold
    #[error("Balance of account {0} would overflow")]
    BalanceOverflow(AccountId),

    /// Persistence layer unreachable; the caller may retry
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A compensating write failed and balances need reconciliation
    #[error("Store left inconsistent: {0}")]
    Inconsistent(String),

    /// Any other backend failure
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn not_found_id(id: AccountId) -> Self {
        Self::NotFound(format!("id {}", id))
    }

    pub fn not_found_number(number: i64) -> Self {
        Self::NotFound(format!("number {}", number))
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) | Some(PG_CHECK_VIOLATION) => {
                    StoreError::ConstraintViolation(db_err.message().to_string())
                }
                _ => StoreError::Database(err.to_string()),
            },
            _ => StoreError::Database(err.to_string()),
        }
    }
}
