//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for the storefront's domain
//! concepts.

pub mod address;
pub mod api;
pub mod contact;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use address::{Address, AddressFields, AddressKind};
pub use api::{ErrorBody, OrderAccepted, OrderSaved};
pub use contact::{Email, EmailError, MobileError, MobileNumber};
pub use id::*;
pub use order::{CustomerSnapshot, Order, OrderItem};
pub use price::{CurrencyCode, Price, round_money};
pub use product::{PLACEHOLDER_IMAGE, Product};
pub use status::OrderStatus;
