//! HTTP route handlers for the order store.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness
//! GET  /health/ready              - Readiness (database ping)
//!
//! POST /api/orders                - Upsert an order in any status
//! POST /api/save-order            - Upsert a confirmed order
//! GET  /api/orders/{orderNumber}  - Fetch an order
//! ```

pub mod health;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the order API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(orders::create))
        .route("/api/save-order", post(orders::save_confirmed))
        .route("/api/orders/{order_number}", get(orders::show))
}

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}
