//! Device-local domain models.
//!
//! These are the shapes persisted in the [`LocalStore`](crate::store::LocalStore).
//! Shared catalog and order types live in `bazaar_core`.

pub mod cart;
pub mod otp;
pub mod user;

pub use cart::{Cart, CartLine, InvalidCart, Wishlist};
pub use otp::PendingOtp;
pub use user::AuthUser;
