//! PostgreSQL account store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Account, AccountId, AccountNumber, Amount, NewAccount};

use super::error::PG_NUMERIC_OUT_OF_RANGE;
use super::{Storage, StoreError, StoreResult};

/// Column order shared by every query that returns a full account
const ACCOUNT_COLUMNS: &str =
    "id, first_name, last_name, number, encrypted_password, balance, created_at";

type AccountRecord = (i64, String, String, i64, String, i64, DateTime<Utc>);

fn into_account(record: AccountRecord) -> Account {
    let (id, first_name, last_name, number, encrypted_password, balance, created_at) = record;
    Account {
        id,
        first_name,
        last_name,
        number,
        encrypted_password,
        balance,
        created_at,
    }
}

/// BIGINT overflow on a balance write becomes `BalanceOverflow(id)`
fn balance_error(id: AccountId) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(PG_NUMERIC_OUT_OF_RANGE) => {
            StoreError::BalanceOverflow(id)
        }
        _ => StoreError::from(err),
    }
}

/// Account store backed by the `accounts` table
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Create a new PgStorage with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn create(&self, account: NewAccount) -> StoreResult<Account> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO accounts (first_name, last_name, number, encrypted_password, balance, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.number)
        .bind(&account.encrypted_password)
        .bind(account.balance)
        .bind(account.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(account.into_account(id))
    }

    async fn delete(&self, id: AccountId) -> StoreResult<()> {
        let rows_affected = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::not_found_id(id));
        }
        Ok(())
    }

    async fn get_by_id(&self, id: AccountId) -> StoreResult<Account> {
        let record: Option<AccountRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        record
            .map(into_account)
            .ok_or_else(|| StoreError::not_found_id(id))
    }

    async fn get_by_number(&self, number: AccountNumber) -> StoreResult<Account> {
        let record: Option<AccountRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE number = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        record
            .map(into_account)
            .ok_or_else(|| StoreError::not_found_number(number))
    }

    async fn get_all(&self) -> StoreResult<Vec<Account>> {
        let records: Vec<AccountRecord> =
            sqlx::query_as(&format!("SELECT {} FROM accounts ORDER BY id", ACCOUNT_COLUMNS))
                .fetch_all(&self.pool)
                .await?;

        Ok(records.into_iter().map(into_account).collect())
    }

    async fn update_profile(
        &self,
        id: AccountId,
        first_name: &str,
        last_name: &str,
    ) -> StoreResult<Account> {
        let record: Option<AccountRecord> = sqlx::query_as(&format!(
            "UPDATE accounts SET first_name = $2, last_name = $3 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(&self.pool)
        .await?;

        record
            .map(into_account)
            .ok_or_else(|| StoreError::not_found_id(id))
    }

    async fn update_balance(&self, id: AccountId, delta: i64) -> StoreResult<Account> {
        // Guarded single-statement read-modify-write: the row lock taken by
        // UPDATE serializes concurrent deltas on the same account.
        let record: Option<AccountRecord> = sqlx::query_as(&format!(
            "UPDATE accounts SET balance = balance + $2 \
             WHERE id = $1 AND balance + $2 >= 0 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(balance_error(id))?;

        match record {
            Some(record) => Ok(into_account(record)),
            None => {
                // Zero rows: either the account is gone or the guard refused.
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE id = $1)")
                        .bind(id)
                        .fetch_one(&self.pool)
                        .await?;
                if exists {
                    Err(StoreError::NegativeBalance(id))
                } else {
                    Err(StoreError::not_found_id(id))
                }
            }
        }
    }

    async fn apply_transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> StoreResult<(Account, Account)> {
        let mut tx = self.pool.begin().await?;

        // Lock both rows lower id first so opposing transfers cannot deadlock.
        let mut ids = [source, destination];
        ids.sort_unstable();
        let locked: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM accounts WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(&ids[..])
                .fetch_all(&mut *tx)
                .await?;

        for id in [source, destination] {
            if !locked.contains(&id) {
                return Err(StoreError::not_found_id(id));
            }
        }

        let debited: Option<AccountRecord> = sqlx::query_as(&format!(
            "UPDATE accounts SET balance = balance - $2 \
             WHERE id = $1 AND balance >= $2 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(source)
        .bind(amount.value())
        .fetch_optional(&mut *tx)
        .await?;
        let debited = debited.ok_or(StoreError::NegativeBalance(source))?;

        let credited: AccountRecord = sqlx::query_as(&format!(
            "UPDATE accounts SET balance = balance + $2 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(destination)
        .bind(amount.value())
        .fetch_one(&mut *tx)
        .await
        .map_err(balance_error(destination))?;

        // Dropping `tx` on any early return above rolls both updates back.
        tx.commit().await?;

        Ok((into_account(debited), into_account(credited)))
    }
}
