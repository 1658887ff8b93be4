//! Database operations for the Pressly `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `accounts` - Order counts, role and interface preference
//! - `producers` - Producer profiles with optional coordinates
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p pressly-cli -- migrate
//! ```

pub mod accounts;
pub mod producers;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use pressly_core::store::StoreError;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Postgres-backed store for accounts and producers.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check that the database answers.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the query fails.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

/// Map a sqlx failure onto the storage port's error.
pub(crate) fn backend(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "database query failed");
    StoreError::Backend(err.to_string())
}

/// Convert a signed column into an unsigned field, flagging negatives.
pub(crate) fn non_negative<T, U>(value: T, column: &str) -> Result<U, StoreError>
where
    U: TryFrom<T>,
    T: Copy + std::fmt::Display,
{
    U::try_from(value)
        .map_err(|_| StoreError::DataCorruption(format!("{column} out of range: {value}")))
}
