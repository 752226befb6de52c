//! Order types.
//!
//! An [`Order`] is a snapshot: items carry the title and unit price copied from
//! the catalog at creation time, and the customer block copies the contact and
//! delivery details. Later catalog or profile changes never alter an order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::address::AddressFields;
use super::contact::Email;
use super::id::{OrderNumber, ProductId};
use super::price::round_money;
use super::status::OrderStatus;

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: ProductId,
    pub title: String,
    /// Unit price at the time the order was created.
    pub price: Decimal,
    pub qty: u32,
}

impl OrderItem {
    /// `price * qty`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.qty)
    }
}

/// Contact and delivery details captured on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    pub name: String,
    pub email: Email,
    pub mobile: String,
    #[serde(flatten)]
    pub address: AddressFields,
}

/// A storefront order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: OrderNumber,
    /// Creation time; never modified.
    pub date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    /// Sum of the item line totals, fixed at creation.
    pub total: Decimal,
    pub customer: CustomerSnapshot,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a pending order, computing the total from the items.
    #[must_use]
    pub fn new(
        order_number: OrderNumber,
        date: DateTime<Utc>,
        items: Vec<OrderItem>,
        customer: CustomerSnapshot,
    ) -> Self {
        let total = Self::total_of(&items);
        Self {
            order_number,
            date,
            items,
            total,
            customer,
            status: OrderStatus::Pending,
            paid_at: None,
            confirmed_at: None,
        }
    }

    /// Two-decimal sum of the line totals.
    #[must_use]
    pub fn total_of(items: &[OrderItem]) -> Decimal {
        round_money(items.iter().map(OrderItem::line_total).sum())
    }

    /// Mark the order paid and confirmed at `at`.
    ///
    /// Returns `false` and leaves the order untouched if it was already
    /// confirmed.
    pub fn confirm(&mut self, at: DateTime<Utc>) -> bool {
        if self.status.is_settled() {
            return false;
        }
        self.status = OrderStatus::Confirmed;
        self.paid_at = Some(at);
        self.confirmed_at = Some(at);
        true
    }

    /// Whether the order still awaits payment.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, OrderStatus::Pending)
    }

    /// Total number of units across all items.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |total, item| total.saturating_add(item.qty))
    }
}
