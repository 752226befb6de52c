//! Integration tests for Bazaar.
//!
//! Each test starts its own order store on an ephemeral port with an
//! in-memory database, so no external services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `order_api` - Order store HTTP API
//! - `checkout_flow` - Storefront engine pushing to a live order store

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::Url;

use bazaar_orders::config::OrdersConfig;
use bazaar_orders::db;
use bazaar_orders::state::AppState;

/// A running order store. Shuts down when dropped.
pub struct OrderStore {
    pub base_url: Url,
    shutdown: Option<oneshot::Sender<()>>,
}

impl OrderStore {
    /// Start an order store on `127.0.0.1` with a fresh in-memory database.
    ///
    /// # Panics
    ///
    /// Panics if the database or listener cannot be set up.
    #[allow(clippy::expect_used, clippy::print_stderr)]
    pub async fn start() -> Self {
        let config = OrdersConfig::for_tests();
        let pool = db::create_pool(&config.database_url)
            .await
            .expect("Failed to open test database");
        db::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let shutdown = async {
                let _ = rx.await;
            };
            if let Err(e) = bazaar_orders::serve(listener, AppState::new(config, pool), shutdown).await {
                eprintln!("order store stopped: {e}");
            }
        });

        let base_url = Url::parse(&format!("http://{addr}/")).expect("Invalid base URL");
        Self {
            base_url,
            shutdown: Some(tx),
        }
    }

    /// Absolute URL for `path` on this store.
    ///
    /// # Panics
    ///
    /// Panics if `path` cannot be joined onto the base URL.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).expect("Invalid path")
    }
}

impl Drop for OrderStore {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
