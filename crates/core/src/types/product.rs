//! Catalog product schema.
//!
//! Products are owned by the catalog and immutable from the storefront's
//! point of view. Orders copy the fields they need at creation time.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Image shown when a product has no usable image.
pub const PLACEHOLDER_IMAGE: &str = "images/placeholder.png";

/// Marker the spreadsheet export writes for an empty image cell.
const MISSING_IMAGE_MARKER: &str = "nan";

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub sku: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Selling price.
    pub price: Decimal,
    /// Maximum retail price (list price before discount).
    #[serde(default)]
    pub mrp: Decimal,
    #[serde(default)]
    pub discount_pct: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Chat-to-order contact link.
    #[serde(default)]
    pub whatsapp: String,
    /// Per-product payment link supplied by the catalog.
    #[serde(default)]
    pub upi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl Product {
    /// First usable image, or the placeholder.
    #[must_use]
    pub fn thumbnail(&self) -> &str {
        self.images
            .first()
            .map(String::as_str)
            .filter(|url| !url.is_empty() && *url != MISSING_IMAGE_MARKER)
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Check the fields every consumer relies on.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("product id cannot be empty".to_owned());
        }
        if self.title.trim().is_empty() {
            return Err(format!("product {} has an empty title", self.id));
        }
        if self.price.is_sign_negative() {
            return Err(format!("product {} has a negative price", self.id));
        }
        Ok(())
    }
}
