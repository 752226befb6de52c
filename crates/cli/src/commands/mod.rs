//! CLI command implementations.

pub mod account;
pub mod addresses;
pub mod checkout;
pub mod migrate;
pub mod orders;
pub mod shop;

use std::io::{BufRead, Write};

use rust_decimal::Decimal;
use thiserror::Error;

use bazaar_core::{CurrencyCode, Price};
use bazaar_storefront::config::{ConfigError, StorefrontConfig};
use bazaar_storefront::services::addresses::AddressError;
use bazaar_storefront::services::cart::CartError;
use bazaar_storefront::services::catalog::CatalogError;
use bazaar_storefront::services::checkout::CheckoutError;
use bazaar_storefront::services::identity::{OtpError, ProfileError};
use bazaar_storefront::services::orders::OrderError;
use bazaar_storefront::store::StoreError;
use bazaar_storefront::{Storefront, StorefrontError};

use self::migrate::MigrationError;

/// Errors surfaced by a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// Bad command-line input.
    #[error("{0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

macro_rules! from_storefront_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CliError {
                fn from(err: $ty) -> Self {
                    Self::Storefront(err.into())
                }
            }
        )*
    };
}

from_storefront_error!(
    ConfigError,
    StoreError,
    CatalogError,
    OtpError,
    ProfileError,
    CartError,
    AddressError,
    OrderError,
    CheckoutError,
);

pub type Result<T> = std::result::Result<T, CliError>;

/// Open the storefront engine from the environment.
///
/// # Errors
///
/// Returns `CliError` if configuration is missing or the store cannot open.
pub fn open_storefront() -> Result<Storefront> {
    let config = StorefrontConfig::from_env()?;
    Ok(Storefront::open(config)?)
}

/// Format an amount in the store currency.
#[must_use]
pub fn money(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).to_string()
}

/// Ask a yes/no question on the terminal. Anything but `y`/`yes` is no.
///
/// # Errors
///
/// Returns `CliError::Io` if the terminal cannot be read.
pub fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
