//! Account Store module
//!
//! Persistence port for account records plus the PostgreSQL and in-memory
//! adapters that satisfy it.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;

use crate::domain::{Account, AccountId, AccountNumber, Amount, NewAccount};

pub use error::StoreError;
pub use memory::InMemoryStorage;
pub use postgres::PgStorage;

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Account storage abstraction
///
/// Implementations must make `update_balance` a single atomic
/// read-modify-write for the account it touches.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a new account and return it with its assigned id.
    /// A duplicate account number fails with `ConstraintViolation`.
    async fn create(&self, account: NewAccount) -> StoreResult<Account>;

    /// Delete an account by id
    async fn delete(&self, id: AccountId) -> StoreResult<()>;

    /// Get account by internal id
    async fn get_by_id(&self, id: AccountId) -> StoreResult<Account>;

    /// Get account by account number
    async fn get_by_number(&self, number: AccountNumber) -> StoreResult<Account>;

    /// Get all accounts, in no particular order
    async fn get_all(&self) -> StoreResult<Vec<Account>>;

    /// Replace the display names of an account
    async fn update_profile(
        &self,
        id: AccountId,
        first_name: &str,
        last_name: &str,
    ) -> StoreResult<Account>;

    /// Add `delta` to the balance of `id`.
    ///
    /// Refuses with `NegativeBalance` instead of letting the balance drop
    /// below zero. Returns the account after the update.
    async fn update_balance(&self, id: AccountId, delta: i64) -> StoreResult<Account>;

    /// Move `amount` from `source` to `destination` as one unit.
    ///
    /// The default is a compensating envelope over two `update_balance`
    /// calls: debit, then credit, and re-credit the source if the credit
    /// fails. Concurrent readers can observe the debit before the credit
    /// lands, so stores with real transactions should override this.
    async fn apply_transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> StoreResult<(Account, Account)> {
        let debited = self.update_balance(source, amount.as_debit()).await?;

        match self.update_balance(destination, amount.as_credit()).await {
            Ok(credited) => Ok((debited, credited)),
            Err(credit_err) => {
                tracing::warn!(
                    source,
                    destination,
                    amount = amount.value(),
                    error = %credit_err,
                    "Credit failed after debit, reversing debit"
                );

                if let Err(rollback_err) = self.update_balance(source, amount.as_credit()).await {
                    tracing::error!(
                        source,
                        destination,
                        amount = amount.value(),
                        error = %rollback_err,
                        "Compensating credit failed, balances need reconciliation"
                    );
                    return Err(StoreError::Inconsistent(format!(
                        "debit of {} from account {} could not be reversed: {}",
                        amount, source, rollback_err
                    )));
                }

                Err(credit_err)
            }
        }
    }
}
