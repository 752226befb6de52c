//! Identity error types.

use thiserror::Error;

use bazaar_core::EmailError;

use super::delivery::DeliveryError;
use crate::store::StoreError;

/// Errors from requesting or verifying a one-time code.
#[derive(Debug, Error)]
pub enum OtpError {
    /// No code has been issued, or it was already used or destroyed.
    #[error("no pending code")]
    NoPendingCode,

    /// The code was issued for a different number.
    #[error("code was issued for a different mobile number")]
    MobileMismatch,

    #[error("code has expired")]
    Expired,

    /// Wrong code; the record survives for another try.
    #[error("incorrect code, {remaining_attempts} attempts left")]
    Mismatch { remaining_attempts: u32 },

    /// Too many wrong codes; the record was destroyed.
    #[error("too many incorrect codes, request a new one")]
    Exhausted,

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from creating or updating the user profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("not signed in")]
    NotSignedIn,

    #[error("name is required")]
    MissingName,

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
