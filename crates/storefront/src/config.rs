//! Storefront engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_UPI_VPA` - UPI address payments are made to (e.g. `shop@okaxis`)
//! - `BAZAAR_UPI_PAYEE_NAME` - Payee name shown in the payment app
//!
//! ## Optional
//! - `BAZAAR_DATA_DIR` - Directory for the local store (default: `.bazaar`)
//! - `BAZAAR_ORDER_API_URL` - Order store base URL (default: `http://localhost:3000`)
//! - `BAZAAR_CATALOG_URL` - Primary catalog source, URL or path (default: `products.json`)
//! - `BAZAAR_CATALOG_FALLBACK_URL` - Fallback catalog source (default: `site_products_sample.json`)
//! - `BAZAAR_CURRENCY` - ISO 4217 code for payments (default: `INR`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use bazaar_core::CurrencyCode;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Who payments go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayeeConfig {
    /// Virtual payment address (`pa` parameter).
    pub vpa: String,
    /// Display name (`pn` parameter).
    pub name: String,
    pub currency: CurrencyCode,
}

/// Where the product catalog is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub primary: String,
    pub fallback: Option<String>,
}

/// Storefront engine configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Directory holding the local store file
    pub data_dir: PathBuf,
    /// Base URL of the remote order store
    pub order_api_url: Url,
    pub catalog: CatalogConfig,
    pub payee: PayeeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let data_dir = PathBuf::from(env.or_default("BAZAAR_DATA_DIR", ".bazaar"));
        let order_api_url = Url::parse(&env.or_default("BAZAAR_ORDER_API_URL", "http://localhost:3000"))
            .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_ORDER_API_URL".to_string(), e.to_string()))?;

        let catalog = CatalogConfig {
            primary: env.or_default("BAZAAR_CATALOG_URL", "products.json"),
            fallback: Some(env.or_default("BAZAAR_CATALOG_FALLBACK_URL", "site_products_sample.json"))
                .filter(|source| !source.is_empty()),
        };

        let currency = env
            .or_default("BAZAAR_CURRENCY", "INR")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("BAZAAR_CURRENCY".to_string(), e))?;
        let payee = PayeeConfig {
            vpa: env.required("BAZAAR_UPI_VPA")?,
            name: env.required("BAZAAR_UPI_PAYEE_NAME")?,
            currency,
        };
        if !payee.vpa.contains('@') {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_UPI_VPA".to_string(),
                "must look like name@bank".to_string(),
            ));
        }

        Ok(Self {
            data_dir,
            order_api_url,
            catalog,
            payee,
            sentry_dsn: env.optional("SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable; empty counts as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }
}
