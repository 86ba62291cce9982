//! Persistence for users, phone challenges, and purchases.
//!
//! - [`repositories`] -- PostgreSQL queries, one repo per table.
//! - [`store`] -- the storage traits the API depends on, plus [`PgStore`].
//! - [`memory`] -- an in-process [`MemoryStore`] with the same guarantees.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use memory::MemoryStore;
pub use store::{PgStore, SettleOutcome, Store, StoreError, StoreResult};

pub type DbPool = sqlx::PgPool;

/// How long a request may wait for a pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Create the process-wide connection pool.
///
/// The pool is built once at startup and cloned into request state; it lives
/// until the process exits.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to prove the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
