//! Unified error handling with Sentry integration.
//!
//! Every service owns its error type. [`StorefrontError`] gathers them for
//! hosts that drive several services and want one place to decide what is a
//! user mistake and what goes to Sentry.

use thiserror::Error;

use crate::config::ConfigError;
use crate::services::addresses::AddressError;
use crate::services::cart::CartError;
use crate::services::catalog::CatalogError;
use crate::services::checkout::CheckoutError;
use crate::services::identity::{OtpError, ProfileError};
use crate::services::orders::OrderError;
use crate::store::StoreError;

/// Any error the storefront engine can return.
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("{0}")]
    Otp(#[from] OtpError),

    #[error("{0}")]
    Profile(#[from] ProfileError),

    #[error("{0}")]
    Cart(#[from] CartError),

    #[error("{0}")]
    Address(#[from] AddressError),

    #[error("{0}")]
    Order(#[from] OrderError),

    #[error("{0}")]
    Checkout(#[from] CheckoutError),
}

impl StorefrontError {
    /// Whether this is a fault of the engine or its environment rather than
    /// bad input from the user.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        match self {
            Self::Config(_) | Self::Store(_) | Self::Catalog(_) => true,
            Self::Otp(e) => matches!(e, OtpError::Store(_) | OtpError::Delivery(_)),
            Self::Profile(e) => matches!(e, ProfileError::Store(_)),
            Self::Cart(e) => matches!(e, CartError::Store(_)),
            Self::Address(e) => matches!(e, AddressError::Store(_)),
            Self::Order(e) => matches!(e, OrderError::Store(_) | OrderError::NumberSpaceExhausted),
            Self::Checkout(e) => matches!(
                e,
                CheckoutError::Store(_)
                    | CheckoutError::Order(OrderError::Store(_) | OrderError::NumberSpaceExhausted)
                    | CheckoutError::Cart(CartError::Store(_))
                    | CheckoutError::Profile(ProfileError::Store(_))
                    | CheckoutError::Address(_)
            ),
        }
    }

    /// Send internal errors to Sentry and log them. Returns whether the error
    /// was reported.
    pub fn report(&self) -> bool {
        if !self.is_internal() {
            return false;
        }
        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Storefront error"
        );
        true
    }
}

/// Set the Sentry user context.
///
/// Call this after sign-in to associate errors with the user.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Order placed", Some(&[("order_number", "ORD-1-ABC")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_are_not_internal() {
        assert!(!StorefrontError::from(OtpError::Expired).is_internal());
        assert!(!StorefrontError::from(CartError::InvalidQuantity).is_internal());
        assert!(!StorefrontError::from(CheckoutError::SignInRequired).is_internal());
        assert!(!StorefrontError::from(OrderError::EmptyCart).report());
    }

    #[test]
    fn test_store_errors_are_internal() {
        assert!(StorefrontError::from(StoreError::Poisoned).is_internal());
        assert!(StorefrontError::from(CheckoutError::Store(StoreError::Poisoned)).is_internal());
        assert!(StorefrontError::from(CatalogError::Empty("products.json".to_string())).is_internal());
    }

    #[test]
    fn test_display_passes_service_message_through() {
        let err = StorefrontError::from(OtpError::Mismatch {
            remaining_attempts: 2,
        });
        assert_eq!(err.to_string(), "incorrect code, 2 attempts left");
    }
}
