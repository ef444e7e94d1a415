//! Account Handlers
//!
//! Account creation with credential hashing, and profile updates.

use std::sync::Arc;

use crate::auth::PasswordService;
use crate::domain::{Account, AccountId, NewAccount};
use crate::error::AppError;
use crate::store::{Storage, StoreError};

use super::{CreateAccountCommand, UpdateAccountCommand};

/// Attempts at drawing an unused account number
const MAX_NUMBER_ATTEMPTS: u32 = 5;

// =========================================================================
// CreateAccountHandler
// =========================================================================

/// Handler for account creation
pub struct CreateAccountHandler {
    store: Arc<dyn Storage>,
    passwords: Arc<PasswordService>,
}

impl CreateAccountHandler {
    pub fn new(store: Arc<dyn Storage>, passwords: Arc<PasswordService>) -> Self {
        Self { store, passwords }
    }

    /// Execute the create account command
    pub async fn execute(&self, command: CreateAccountCommand) -> Result<Account, AppError> {
        let (first_name, last_name) = command.validate()?;

        // Argon2 is deliberately slow; keep it off the async workers.
        let passwords = Arc::clone(&self.passwords);
        let password = command.password;
        let encrypted_password =
            tokio::task::spawn_blocking(move || passwords.hash_password(&password))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))??;

        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let draft = NewAccount::new(&first_name, &last_name, &encrypted_password);
            let number = draft.number;

            match self.store.create(draft).await {
                Ok(account) => {
                    tracing::info!(
                        account_id = account.id,
                        number = account.number,
                        "Account created"
                    );
                    return Ok(account);
                }
                Err(StoreError::ConstraintViolation(reason)) => {
                    tracing::warn!(
                        number,
                        attempt,
                        "Account number collision ({}), drawing a new one",
                        reason
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Internal(format!(
            "no free account number after {} attempts",
            MAX_NUMBER_ATTEMPTS
        )))
    }
}

// =========================================================================
// UpdateAccountHandler
// =========================================================================

/// Handler for display-name updates
pub struct UpdateAccountHandler {
    store: Arc<dyn Storage>,
}

impl UpdateAccountHandler {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Apply the provided fields; omitted fields keep their current value
    pub async fn execute(
        &self,
        id: AccountId,
        command: UpdateAccountCommand,
    ) -> Result<Account, AppError> {
        let current = self.store.get_by_id(id).await?;

        let first_name = non_empty(command.first_name, "firstName")?
            .unwrap_or(current.first_name);
        let last_name = non_empty(command.last_name, "lastName")?
            .unwrap_or(current.last_name);

        let updated = self
            .store
            .update_profile(id, &first_name, &last_name)
            .await?;

        tracing::info!(account_id = id, "Account profile updated");
        Ok(updated)
    }
}

fn non_empty(value: Option<String>, field: &str) -> Result<Option<String>, AppError> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(AppError::InvalidRequest(format!("{} must not be empty", field)))
        }
        Some(v) => Ok(Some(v.trim().to_string())),
        None => Ok(None),
    }
}
