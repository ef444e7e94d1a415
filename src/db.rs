//! Database module
//!
//! Database connection and schema utilities.

use sqlx::{Executor, PgPool};

/// Schema applied at startup, kept as raw SQL under `migrations/`
const ACCOUNTS_SCHEMA: &str = include_str!("../migrations/0001_accounts.sql");

/// Tables the service cannot run without
const REQUIRED_TABLES: &[&str] = &["accounts"];

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Create the accounts table if it does not exist yet
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(ACCOUNTS_SCHEMA).await?;
    tracing::debug!("Accounts schema ensured");
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}
