//! Account record
//!
//! The persisted account and the draft used to create one.

use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use serde::Serialize;

/// Store-assigned internal account identifier
pub type AccountId = i64;

/// Externally visible account number
pub type AccountNumber = i64;

/// Range account numbers are drawn from (9 digits)
const ACCOUNT_NUMBER_RANGE: std::ops::Range<AccountNumber> = 100_000_000..1_000_000_000;

/// A bank account as stored.
///
/// Serializes as `{id, firstName, lastName, number, balance, createdAt}`.
/// The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub number: AccountNumber,
    #[serde(skip_serializing)]
    pub encrypted_password: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

/// Account fields known before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub number: AccountNumber,
    pub encrypted_password: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    /// Draft an account with a random number, zero balance and `created_at = now`.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        encrypted_password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            number: generate_account_number(),
            encrypted_password: encrypted_password.into(),
            balance: 0,
            // Postgres keeps microseconds; truncate so both stores agree on the value.
            created_at: truncate_to_micros(Utc::now()),
        }
    }

    /// Attach the store-assigned id.
    pub fn into_account(self, id: AccountId) -> Account {
        Account {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            number: self.number,
            encrypted_password: self.encrypted_password,
            balance: self.balance,
            created_at: self.created_at,
        }
    }
}

/// Draw a fresh random account number
pub fn generate_account_number() -> AccountNumber {
    rand::thread_rng().gen_range(ACCOUNT_NUMBER_RANGE)
}

fn truncate_to_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}
