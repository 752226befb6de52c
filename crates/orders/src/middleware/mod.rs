//! HTTP middleware for the order store.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. CORS (permissive; the storefront is a static site on another origin)
//! 3. `TraceLayer` (request span with `request_id` field)
//! 4. Request ID (fills the span field and Sentry tag)
//! 5. Rate limiting on `/api` routes (governor)

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::api_rate_limiter;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
