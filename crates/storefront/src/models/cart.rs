//! Cart and wishlist collections.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_core::ProductId;

/// A product and how many of it the shopper wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    /// Always at least 1; a line that would drop to 0 is removed.
    pub qty: u32,
}

/// A stored cart that breaks the cart invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCart {
    #[error("cart line for {0} has quantity 0")]
    ZeroQuantity(ProductId),
    #[error("product {0} appears in more than one cart line")]
    DuplicateProduct(ProductId),
}

/// The cart: at most one line per product, in the order products were added.
///
/// Decoding goes through [`TryFrom<Vec<CartLine>>`], so a stored cart with a
/// zero quantity or a repeated product fails to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl TryFrom<Vec<CartLine>> for Cart {
    type Error = InvalidCart;

    fn try_from(lines: Vec<CartLine>) -> Result<Self, Self::Error> {
        for (i, line) in lines.iter().enumerate() {
            if line.qty == 0 {
                return Err(InvalidCart::ZeroQuantity(line.id.clone()));
            }
            if lines.iter().skip(i + 1).any(|other| other.id == line.id) {
                return Err(InvalidCart::DuplicateProduct(line.id.clone()));
            }
        }
        Ok(Self { lines })
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

impl Cart {
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add `qty` units, merging into an existing line for the same product.
    /// Adding zero units is a no-op.
    pub fn add(&mut self, id: &ProductId, qty: u32) {
        if qty == 0 {
            return;
        }
        match self.lines.iter_mut().find(|line| &line.id == id) {
            Some(line) => line.qty = line.qty.saturating_add(qty),
            None => self.lines.push(CartLine {
                id: id.clone(),
                qty,
            }),
        }
    }

    /// Set the quantity of a line; a quantity of zero or less removes it.
    /// Setting a quantity for a product not in the cart adds it.
    pub fn set_quantity(&mut self, id: &ProductId, qty: i64) {
        if qty <= 0 {
            self.remove(id);
            return;
        }
        let qty = u32::try_from(qty).unwrap_or(u32::MAX);
        match self.lines.iter_mut().find(|line| &line.id == id) {
            Some(line) => line.qty = qty,
            None => self.lines.push(CartLine {
                id: id.clone(),
                qty,
            }),
        }
    }

    /// Drop the line for `id`. Returns whether a line was removed.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.id != id);
        self.lines.len() != before
    }

    /// Units across all lines, saturating at `u32::MAX`.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |total, line| total.saturating_add(line.qty))
    }
}

/// Saved-for-later products, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    ids: Vec<ProductId>,
}

impl Wishlist {
    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Add `id` if absent, remove it if present. Returns whether it is now in
    /// the wishlist.
    pub fn toggle(&mut self, id: &ProductId) -> bool {
        if let Some(pos) = self.ids.iter().position(|existing| existing == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.clone());
            true
        }
    }
}
