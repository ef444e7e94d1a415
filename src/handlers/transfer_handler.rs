//! Transfer Handler
//!
//! Moves money between two accounts with full validation. The debit and
//! credit are applied through `Storage::apply_transfer`, which is either a
//! store transaction or a compensating envelope.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Account, AccountNumber, Amount, Balance, DomainError, OperationContext};
use crate::error::AppError;
use crate::store::{Storage, StoreError};

use super::{AccountBalance, TransferCommand, TransferResult};

/// Handler for account-to-account transfers
pub struct TransferHandler {
    store: Arc<dyn Storage>,
}

impl TransferHandler {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Execute the transfer command
    pub async fn execute(
        &self,
        command: TransferCommand,
        context: &OperationContext,
    ) -> Result<TransferResult, AppError> {
        // Only the holder of the source account may move its money.
        match context.account {
            Some(account) if account.account_number == command.source => {}
            _ => return Err(AppError::Forbidden),
        }

        let amount = Amount::new(command.amount)?;

        if command.source == command.destination {
            return Err(DomainError::SameAccountTransfer.into());
        }

        let source = self.resolve(command.source).await?;
        let destination = self.resolve(command.destination).await?;

        let available = Balance::new(source.balance).map_err(|e| {
            StoreError::Inconsistent(format!("account {} holds {}: {}", source.id, source.balance, e))
        })?;
        if !available.is_sufficient_for(&amount) {
            return Err(DomainError::insufficient_funds(amount.value(), source.balance).into());
        }

        let (source_after, destination_after) = self
            .store
            .apply_transfer(source.id, destination.id, amount)
            .await
            .map_err(|e| match e {
                // Balance moved between the check above and the guarded update.
                StoreError::NegativeBalance(id) if id == source.id => {
                    DomainError::insufficient_funds(amount.value(), source.balance).into()
                }
                other => AppError::from(other),
            })?;

        let transfer_id = Uuid::new_v4();

        tracing::info!(
            transfer_id = %transfer_id,
            source = command.source,
            destination = command.destination,
            amount = amount.value(),
            correlation_id = ?context.correlation_id,
            "Transfer completed"
        );

        Ok(TransferResult {
            transfer_id,
            amount: amount.value(),
            source: AccountBalance::from(&source_after),
            destination: AccountBalance::from(&destination_after),
        })
    }

    async fn resolve(&self, number: AccountNumber) -> Result<Account, AppError> {
        self.store.get_by_number(number).await.map_err(|e| match e {
            StoreError::NotFound(_) => DomainError::AccountNotFound(number.to_string()).into(),
            other => AppError::from(other),
        })
    }
}
