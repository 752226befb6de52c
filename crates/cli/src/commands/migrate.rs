//! Order store migration command.
//!
//! # Usage
//!
//! ```bash
//! bazaar migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ORDERS_DATABASE_URL` - `SQLite` URL of the order store (falls back to
//!   `DATABASE_URL`, then `sqlite://orders.db`)

use bazaar_orders::config::{ConfigError, OrdersConfig};
use bazaar_orders::db;
use thiserror::Error;

/// Errors from running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply pending order store migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database cannot be reached or a migration
/// fails.
pub async fn orders() -> Result<(), MigrationError> {
    let config = OrdersConfig::from_env()?;

    tracing::info!("Connecting to order store database...");
    let pool = db::create_pool(&config.database_url).await?;

    tracing::info!("Running order store migrations...");
    db::migrate(&pool).await?;

    tracing::info!("Order store migrations complete!");
    Ok(())
}
