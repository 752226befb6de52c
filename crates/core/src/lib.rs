//! Bazaar Core - Shared domain types.
//!
//! This crate provides the types used across all Bazaar components:
//! - `storefront` - Client engine (cart, identity, checkout, local store)
//! - `orders` - Remote order store (HTTP + `SQLite`)
//! - `cli` - Terminal host that drives the storefront engine
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Both sides of the order sync wire format
//! live here so the client and the order store cannot drift apart.
//!
//! # Modules
//!
//! - [`types`] - Ids, money, contact details, products, addresses, orders and
//!   the order store request/response bodies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
