//! In-memory account store
//!
//! Backs tests and local runs without a database. Every operation holds
//! one mutex for its whole read-modify-write, so balance updates on the
//! same account serialize.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{Account, AccountId, AccountNumber, Amount, AmountError, Balance, NewAccount};

use super::{Storage, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Accounts {
    next_id: AccountId,
    by_id: HashMap<AccountId, Account>,
}

impl Accounts {
    fn get_mut(&mut self, id: AccountId) -> StoreResult<&mut Account> {
        self.by_id
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found_id(id))
    }
}

/// Account store kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    accounts: Mutex<Accounts>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Accounts>> {
        self.accounts
            .lock()
            .map_err(|_| StoreError::Unavailable("account map lock poisoned".to_string()))
    }
}

fn next_balance(account: &Account, delta: i64) -> StoreResult<i64> {
    let current = Balance::new(account.balance)
        .map_err(|e| StoreError::Inconsistent(format!("account {}: {}", account.id, e)))?;
    current.apply(delta).map(|b| b.value()).map_err(|e| match e {
        AmountError::Overflow => StoreError::BalanceOverflow(account.id),
        _ => StoreError::NegativeBalance(account.id),
    })
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create(&self, account: NewAccount) -> StoreResult<Account> {
        let mut accounts = self.lock()?;

        if accounts.by_id.values().any(|a| a.number == account.number) {
            return Err(StoreError::ConstraintViolation(format!(
                "account number {} already exists",
                account.number
            )));
        }

        accounts.next_id += 1;
        let account = account.into_account(accounts.next_id);
        accounts.by_id.insert(account.id, account.clone());

        Ok(account)
    }

    async fn delete(&self, id: AccountId) -> StoreResult<()> {
        self.lock()?
            .by_id
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found_id(id))
    }

    async fn get_by_id(&self, id: AccountId) -> StoreResult<Account> {
        self.lock()?
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found_id(id))
    }

    async fn get_by_number(&self, number: AccountNumber) -> StoreResult<Account> {
        self.lock()?
            .by_id
            .values()
            .find(|a| a.number == number)
            .cloned()
            .ok_or_else(|| StoreError::not_found_number(number))
    }

    async fn get_all(&self) -> StoreResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self.lock()?.by_id.values().cloned().collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn update_profile(
        &self,
        id: AccountId,
        first_name: &str,
        last_name: &str,
    ) -> StoreResult<Account> {
        let mut accounts = self.lock()?;
        let account = accounts.get_mut(id)?;
        account.first_name = first_name.to_string();
        account.last_name = last_name.to_string();
        Ok(account.clone())
    }

    async fn update_balance(&self, id: AccountId, delta: i64) -> StoreResult<Account> {
        let mut accounts = self.lock()?;
        let account = accounts.get_mut(id)?;
        account.balance = next_balance(account, delta)?;
        Ok(account.clone())
    }

    async fn apply_transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> StoreResult<(Account, Account)> {
        let mut accounts = self.lock()?;

        // Both must exist before either balance moves.
        accounts.get_mut(destination)?;

        let debited = accounts.get_mut(source)?;
        let before_debit = debited.balance;
        debited.balance = next_balance(debited, amount.as_debit())?;
        let debited = debited.clone();

        // The credit reads the post-debit value, so a self transfer nets to zero.
        let credited = accounts.get_mut(destination)?;
        match next_balance(credited, amount.as_credit()) {
            Ok(balance) => credited.balance = balance,
            Err(e) => {
                accounts.get_mut(source)?.balance = before_debit;
                return Err(e);
            }
        }
        let credited = credited.clone();

        Ok((debited, credited))
    }
}
