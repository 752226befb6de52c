//! Catalog, cart and wishlist commands.

use bazaar_core::ProductId;
use bazaar_storefront::Storefront;
use bazaar_storefront::services::catalog::CatalogLookup;

use super::{Result, money};

/// List catalog products, optionally within one category.
pub async fn products(storefront: &Storefront, category: Option<&str>) -> Result<()> {
    let catalog = storefront.catalog().fetch().await?;
    let currency = storefront.config().payee.currency;

    for product in catalog
        .products()
        .iter()
        .filter(|p| category.is_none_or(|c| p.category.eq_ignore_ascii_case(c)))
    {
        println!(
            "{:<12} {:<40} {:>10}  {}",
            product.id.as_str(),
            product.title,
            money(product.price, currency),
            product.category
        );
    }
    Ok(())
}

pub fn cart_add(storefront: &Storefront, id: &str, qty: u32) -> Result<()> {
    let cart = storefront.cart().add_item(&ProductId::new(id), qty)?;
    println!("Added to cart ({} items)", cart.total_quantity());
    Ok(())
}

pub fn cart_set(storefront: &Storefront, id: &str, qty: i64) -> Result<()> {
    let cart = storefront.cart().set_quantity(&ProductId::new(id), qty)?;
    println!("Cart updated ({} items)", cart.total_quantity());
    Ok(())
}

pub fn cart_remove(storefront: &Storefront, id: &str) -> Result<()> {
    let cart = storefront.cart().remove_item(&ProductId::new(id))?;
    println!("Removed ({} items left)", cart.total_quantity());
    Ok(())
}

pub fn cart_clear(storefront: &Storefront) -> Result<()> {
    storefront.cart().clear()?;
    println!("Cart cleared");
    Ok(())
}

/// Print the cart priced against the catalog.
pub async fn cart_show(storefront: &Storefront) -> Result<()> {
    let catalog = storefront.catalog().fetch_or_empty().await;
    let summary = storefront.cart().summary(catalog.as_ref())?;
    let currency = storefront.config().payee.currency;

    if summary.lines.is_empty() {
        println!("Cart is empty");
    }
    for line in &summary.lines {
        println!(
            "{:<12} {:<40} x{:<3} {:>10}",
            line.product.id.as_str(),
            line.product.title,
            line.qty,
            money(line.line_total, currency)
        );
    }
    for id in &summary.skipped {
        println!("{:<12} (no longer available)", id.as_str());
    }
    println!("Subtotal: {}", money(summary.subtotal, currency));
    Ok(())
}

pub fn wishlist_toggle(storefront: &Storefront, id: &str) -> Result<()> {
    let change = storefront.cart().toggle_wishlist(&ProductId::new(id))?;
    println!("{}", change.message);
    Ok(())
}

pub async fn wishlist_show(storefront: &Storefront) -> Result<()> {
    let wishlist = storefront.cart().wishlist()?;
    let catalog = storefront.catalog().fetch_or_empty().await;

    if wishlist.is_empty() {
        println!("Wishlist is empty");
    }
    for id in wishlist.ids() {
        match catalog.find(id) {
            Some(product) => println!("{:<12} {}", id.as_str(), product.title),
            None => println!("{:<12} (no longer available)", id.as_str()),
        }
    }
    Ok(())
}
