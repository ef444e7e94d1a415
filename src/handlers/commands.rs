//! Command definitions
//!
//! Commands represent intentions to change the system state.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Account, AccountNumber};
use crate::error::AppError;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

// =========================================================================
// CreateAccountCommand
// =========================================================================

/// Command to open a new account
#[derive(Clone, Deserialize)]
pub struct CreateAccountCommand {
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl CreateAccountCommand {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            password: password.into(),
        }
    }

    /// Check required fields; names are returned trimmed
    pub fn validate(&self) -> Result<(String, String), AppError> {
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();

        if first_name.is_empty() {
            return Err(AppError::InvalidRequest("firstName is required".to_string()));
        }
        if last_name.is_empty() {
            return Err(AppError::InvalidRequest("lastName is required".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidRequest(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        Ok((first_name.to_string(), last_name.to_string()))
    }
}

impl fmt::Debug for CreateAccountCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateAccountCommand")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// =========================================================================
// UpdateAccountCommand
// =========================================================================

/// Command to change an account's display names
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccountCommand {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

// =========================================================================
// LoginCommand
// =========================================================================

/// Command to exchange credentials for an access token
#[derive(Clone, Deserialize)]
pub struct LoginCommand {
    pub number: AccountNumber,
    pub password: String,
}

impl LoginCommand {
    pub fn new(number: AccountNumber, password: impl Into<String>) -> Self {
        Self {
            number,
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("number", &self.number)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// =========================================================================
// TransferCommand
// =========================================================================

/// Command to move money between two accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    /// Account number of the sender
    pub source: AccountNumber,
    /// Account number of the recipient
    pub destination: AccountNumber,
    /// Amount in minor units; validated by the handler
    pub amount: i64,
}

impl TransferCommand {
    pub fn new(source: AccountNumber, destination: AccountNumber, amount: i64) -> Self {
        Self {
            source,
            destination,
            amount,
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    pub token: String,
    pub number: AccountNumber,
}

/// Post-transfer balance of one side of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub number: AccountNumber,
    pub balance: i64,
}

impl From<&Account> for AccountBalance {
    fn from(account: &Account) -> Self {
        Self {
            number: account.number,
            balance: account.balance,
        }
    }
}

/// Result of a successful transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub transfer_id: Uuid,
    pub amount: i64,
    pub source: AccountBalance,
    pub destination: AccountBalance,
}
