//! PostgreSQL store tests
//!
//! Need a reachable database in `DATABASE_URL`; run with `cargo test -- --ignored`.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio_test::{assert_err, assert_ok};

use bank_api::db;
use bank_api::domain::{Account, Amount, NewAccount};
use bank_api::store::{PgStorage, Storage, StoreError};

async fn setup() -> (PgPool, PgStorage) {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::ensure_schema(&pool).await.expect("Failed to apply schema");
    assert!(db::check_schema(&pool).await.unwrap());

    (pool.clone(), PgStorage::new(pool))
}

async fn open(store: &PgStorage, balance: i64) -> Account {
    let account = store
        .create(NewAccount::new("Pg", "Test", "$argon2id$unused"))
        .await
        .unwrap();
    if balance == 0 {
        return account;
    }
    store.update_balance(account.id, balance).await.unwrap()
}

#[tokio::test]
#[ignore]
async fn test_account_lifecycle() {
    let (_pool, store) = setup().await;
    let account = open(&store, 0).await;

    let fetched = assert_ok!(store.get_by_number(account.number).await);
    assert_eq!(fetched, account);

    let renamed = assert_ok!(store.update_profile(account.id, "Renamed", "Holder").await);
    assert_eq!(renamed.first_name, "Renamed");

    assert_ok!(store.delete(account.id).await);
    assert!(matches!(
        store.get_by_id(account.id).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.delete(account.id).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore]
async fn test_duplicate_number_is_constraint_violation() {
    let (_pool, store) = setup().await;
    let account = open(&store, 0).await;

    let mut duplicate = NewAccount::new("Dup", "Licate", "$argon2id$unused");
    duplicate.number = account.number;

    assert!(matches!(
        store.create(duplicate).await,
        Err(StoreError::ConstraintViolation(_))
    ));

    store.delete(account.id).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_guarded_debit_refuses_overdraft() {
    let (_pool, store) = setup().await;
    let account = open(&store, 40).await;

    let result = store.update_balance(account.id, -41).await;
    assert!(matches!(result, Err(StoreError::NegativeBalance(id)) if id == account.id));
    assert_eq!(store.get_by_id(account.id).await.unwrap().balance, 40);

    assert_err!(store.update_balance(-1, 10).await);

    store.delete(account.id).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_concurrent_transfers_conserve_total() {
    let (_pool, store) = setup().await;
    let store = Arc::new(store);
    let alice = open(&store, 300).await;
    let bob = open(&store, 300).await;

    let mut tasks = Vec::new();
    for i in 0..100 {
        let (from, to) = if i % 2 == 0 { (alice.id, bob.id) } else { (bob.id, alice.id) };
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            store
                .apply_transfer(from, to, Amount::new(5).unwrap())
                .await
        }));
    }
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) | Err(StoreError::NegativeBalance(_)) => {}
            Err(other) => panic!("unexpected store error: {:?}", other),
        }
    }

    let total = store.get_by_id(alice.id).await.unwrap().balance
        + store.get_by_id(bob.id).await.unwrap().balance;
    assert_eq!(total, 600);

    store.delete(alice.id).await.unwrap();
    store.delete(bob.id).await.unwrap();
}
