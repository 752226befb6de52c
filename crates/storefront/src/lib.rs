//! Bazaar storefront engine.
//!
//! Everything a storefront does on the shopper's device: catalog lookup,
//! cart and wishlist, one-time code sign-in, saved addresses, the order
//! lifecycle and UPI checkout. State lives in a device-local store; orders are
//! mirrored to the remote order store in the background.
//!
//! The host (a terminal, a web shell) owns presentation and decides how
//! payment links are shown. Start from [`Storefront`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod store;

pub use error::{Result, StorefrontError};
pub use state::Storefront;
