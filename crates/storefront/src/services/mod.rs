//! Storefront services.
//!
//! # Services
//!
//! - `identity` - One-time code sign-in and the local user profile
//! - `cart` - Cart and wishlist
//! - `addresses` - Saved delivery addresses
//! - `catalog` - Product catalog loading and lookup
//! - `orders` - Order lifecycle (`pending -> confirmed`)
//! - `sync` - Background pushes to the remote order store
//! - `payment` - UPI payment links and how they are shown
//! - `checkout` - The checkout flow across all of the above

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod identity;
pub mod orders;
pub mod payment;
pub mod sync;

use std::time::Duration;

/// Longest time to wait for a TCP connection to a remote service.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client with connect and whole-request deadlines.
///
/// Falls back to an unconfigured client only if the TLS backend cannot be
/// initialised, which is logged.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to configure HTTP client, using defaults");
            reqwest::Client::new()
        })
}
