//! Cart and wishlist service.
//!
//! Counts and totals are always derived from the stored collections, never
//! stored themselves.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use bazaar_core::{Product, ProductId, round_money};

use crate::models::{Cart, Wishlist};
use crate::services::catalog::CatalogLookup;
use crate::store::{LocalStore, LocalStoreExt, StoreError, StoreKey};

const ADDED_TO_WISHLIST: &str = "Added to wishlist";
const REMOVED_FROM_WISHLIST: &str = "Removed from wishlist";

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result of toggling a wishlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishlistChange {
    pub in_wishlist: bool,
    pub message: &'static str,
}

/// A cart line resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product: Product,
    pub qty: u32,
    pub line_total: Decimal,
}

/// The cart priced against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
    /// Cart entries with no matching product.
    pub skipped: Vec<ProductId>,
}

impl CartSummary {
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |total, line| total.saturating_add(line.qty))
    }
}

/// Cart and wishlist backed by the local store.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn LocalStore>,
}

impl CartService {
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `CartError::Store` if the stored cart cannot be read.
    pub fn cart(&self) -> Result<Cart, CartError> {
        Ok(self.store.load_or_default(StoreKey::Cart)?)
    }

    /// Add `qty` units of `id`, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `qty` is zero.
    pub fn add_item(&self, id: &ProductId, qty: u32) -> Result<Cart, CartError> {
        if qty == 0 {
            return Err(CartError::InvalidQuantity);
        }
        self.update(|cart| cart.add(id, qty))
    }

    /// Set the quantity for `id`; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` on storage failure.
    pub fn set_quantity(&self, id: &ProductId, qty: i64) -> Result<Cart, CartError> {
        self.update(|cart| cart.set_quantity(id, qty))
    }

    /// # Errors
    ///
    /// Returns `CartError::Store` on storage failure.
    pub fn remove_item(&self, id: &ProductId) -> Result<Cart, CartError> {
        self.update(|cart| {
            cart.remove(id);
        })
    }

    /// # Errors
    ///
    /// Returns `CartError::Store` on storage failure.
    pub fn clear(&self) -> Result<(), CartError> {
        self.store.save(StoreKey::Cart, &Cart::default())?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `CartError::Store` if the stored cart cannot be read.
    pub fn total_quantity(&self) -> Result<u32, CartError> {
        Ok(self.cart()?.total_quantity())
    }

    /// Price the cart. Lines whose product is missing from the catalog are
    /// listed in `skipped` and left out of the subtotal.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the stored cart cannot be read.
    pub fn summary(&self, catalog: &dyn CatalogLookup) -> Result<CartSummary, CartError> {
        let cart = self.cart()?;
        let mut summary = CartSummary::default();

        for line in cart.lines() {
            match catalog.find(&line.id) {
                Some(product) => {
                    let line_total = product.price * Decimal::from(line.qty);
                    summary.subtotal += line_total;
                    summary.lines.push(PricedLine {
                        product: product.clone(),
                        qty: line.qty,
                        line_total,
                    });
                }
                None => summary.skipped.push(line.id.clone()),
            }
        }

        summary.subtotal = round_money(summary.subtotal);
        Ok(summary)
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// # Errors
    ///
    /// Returns `CartError::Store` if the stored wishlist cannot be read.
    pub fn wishlist(&self) -> Result<Wishlist, CartError> {
        Ok(self.store.load_or_default(StoreKey::Wishlist)?)
    }

    /// Add `id` to the wishlist or take it out.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` on storage failure.
    pub fn toggle_wishlist(&self, id: &ProductId) -> Result<WishlistChange, CartError> {
        let mut wishlist = self.wishlist()?;
        let in_wishlist = wishlist.toggle(id);
        self.store.save(StoreKey::Wishlist, &wishlist)?;

        Ok(WishlistChange {
            in_wishlist,
            message: if in_wishlist {
                ADDED_TO_WISHLIST
            } else {
                REMOVED_FROM_WISHLIST
            },
        })
    }

    /// # Errors
    ///
    /// Returns `CartError::Store` if the stored wishlist cannot be read.
    pub fn wishlist_count(&self) -> Result<usize, CartError> {
        Ok(self.wishlist()?.len())
    }

    fn update(&self, change: impl FnOnce(&mut Cart)) -> Result<Cart, CartError> {
        let mut cart = self.cart()?;
        change(&mut cart);
        self.store.save(StoreKey::Cart, &cart)?;
        Ok(cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::services::catalog::Catalog;
    use crate::store::MemoryStore;

    fn p(id: &str) -> ProductId {
        ProductId::new(id)
    }

    fn product(id: &str, price: &str) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Product {id}"),
            "price": price,
        }))
        .unwrap()
    }

    fn service() -> CartService {
        CartService::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_malformed_stored_cart_is_corrupt() {
        let store = Arc::new(MemoryStore::new());
        store
            .write(
                StoreKey::Cart,
                br#"[{"id":"P1","qty":0},{"id":"P2","qty":1},{"id":"P2","qty":1}]"#,
            )
            .unwrap();
        let cart = CartService::new(store);

        assert!(matches!(
            cart.cart(),
            Err(CartError::Store(StoreError::Corrupt { key: StoreKey::Cart, .. }))
        ));
        assert!(matches!(cart.add_item(&p("P3"), 1), Err(CartError::Store(_))));
    }

    #[test]
    fn test_add_rejects_zero() {
        let cart = service();
        assert!(matches!(cart.add_item(&p("P1"), 0), Err(CartError::InvalidQuantity)));
        assert!(cart.cart().unwrap().is_empty());
    }

    #[test]
    fn test_quantities_persist() {
        let cart = service();
        cart.add_item(&p("P1"), 2).unwrap();
        cart.add_item(&p("P2"), 1).unwrap();
        cart.add_item(&p("P1"), 1).unwrap();
        assert_eq!(cart.total_quantity().unwrap(), 4);

        cart.set_quantity(&p("P2"), 0).unwrap();
        cart.remove_item(&p("P9")).unwrap();
        assert_eq!(cart.cart().unwrap().lines().len(), 1);

        cart.clear().unwrap();
        assert_eq!(cart.total_quantity().unwrap(), 0);
    }

    #[test]
    fn test_summary_prices_known_lines() {
        let cart = service();
        cart.add_item(&p("P1"), 2).unwrap();
        cart.add_item(&p("GONE"), 1).unwrap();
        cart.add_item(&p("P2"), 3).unwrap();

        let catalog = Catalog::new(vec![product("P1", "100"), product("P2", "33.335")]);
        let summary = cart.summary(&catalog).unwrap();

        assert_eq!(summary.lines.len(), 2);
        assert_eq!(summary.skipped, vec![p("GONE")]);
        assert_eq!(summary.item_count(), 5);
        assert_eq!(summary.subtotal, Decimal::from_str("300.01").unwrap());
    }

    #[test]
    fn test_wishlist_toggle_messages() {
        let cart = service();
        let added = cart.toggle_wishlist(&p("P1")).unwrap();
        assert!(added.in_wishlist);
        assert_eq!(added.message, "Added to wishlist");
        assert_eq!(cart.wishlist_count().unwrap(), 1);

        let removed = cart.toggle_wishlist(&p("P1")).unwrap();
        assert!(!removed.in_wishlist);
        assert_eq!(removed.message, "Removed from wishlist");
        assert_eq!(cart.wishlist_count().unwrap(), 0);
    }
}
