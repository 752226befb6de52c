//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round an amount to two decimal places (half away from zero) with a fixed
/// scale of 2, so `200` renders as `200.00` both in JSON and in payment links.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            self.currency_code.symbol(),
            round_money(self.amount)
        )
    }
}

/// ISO 4217 currency codes accepted by the payment rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO 4217 code as used in the `cu` payment parameter.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}
