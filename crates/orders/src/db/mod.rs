//! Database operations for the order store.
//!
//! # Database: `SQLite`
//!
//! ## Tables
//!
//! - `orders` - One row per order number; the order itself is a JSON document
//!
//! # Migrations
//!
//! Migrations are stored in `crates/orders/migrations/`. The server applies them
//! on startup; they can also be run explicitly:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod orders;

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub use orders::{OrderRepository, StoredOrder};

/// How long a writer waits for the database lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `SQLite` connection pool.
///
/// The database file is created if it does not exist. An in-memory URL
/// (`sqlite::memory:`) gets a single connection that is never recycled, since
/// every connection to `:memory:` is a separate database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let url = database_url.expose_secret();
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .busy_timeout(BUSY_TIMEOUT);

    if url.contains(":memory:") {
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await;
    }

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
