//! Status enums for orders.

use serde::{Deserialize, Serialize};

/// Order payment status.
///
/// The lifecycle has exactly one transition, `Pending -> Confirmed`. There is
/// no cancelled or failed state: an abandoned payment leaves the order pending
/// and resumable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, awaiting the customer's payment confirmation.
    #[default]
    Pending,
    /// Customer asserted the payment was made.
    Confirmed,
}

impl OrderStatus {
    /// Whether moving from `self` to `next` is a legal lifecycle step.
    ///
    /// Staying in the same state counts as legal so repeated confirmations
    /// stay idempotent.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, _) | (Self::Confirmed, Self::Confirmed)
        )
    }

    /// Whether the order has been settled.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}
