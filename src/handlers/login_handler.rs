//! Login Handler
//!
//! Verifies an account's password and issues an access token.

use std::sync::Arc;

use crate::auth::{PasswordService, TokenService};
use crate::error::AppError;
use crate::store::{Storage, StoreError};

use super::{LoginCommand, LoginResult};

/// Handler for credential login
pub struct LoginHandler {
    store: Arc<dyn Storage>,
    passwords: Arc<PasswordService>,
    tokens: Arc<TokenService>,
}

impl LoginHandler {
    pub fn new(
        store: Arc<dyn Storage>,
        passwords: Arc<PasswordService>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            store,
            passwords,
            tokens,
        }
    }

    /// Execute the login command
    pub async fn execute(&self, command: LoginCommand) -> Result<LoginResult, AppError> {
        // Unknown number and wrong password look the same to the caller.
        let account = match self.store.get_by_number(command.number).await {
            Ok(account) => account,
            Err(StoreError::NotFound(_)) => return Err(AppError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        let passwords = Arc::clone(&self.passwords);
        let stored_hash = account.encrypted_password.clone();
        let password = command.password;
        let verified = tokio::task::spawn_blocking(move || {
            passwords.verify_password(&password, &stored_hash)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

        if !verified {
            tracing::info!(number = account.number, "Login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue_token(&account)?;

        tracing::info!(account_id = account.id, number = account.number, "Login succeeded");

        Ok(LoginResult {
            token,
            number: account.number,
        })
    }
}
