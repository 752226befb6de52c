//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::OrdersConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: OrdersConfig,
    pool: SqlitePool,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: OrdersConfig, pool: SqlitePool) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pool }),
        }
    }

    /// Get a reference to the order store configuration.
    #[must_use]
    pub fn config(&self) -> &OrdersConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }
}
