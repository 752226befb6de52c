//! Order history commands.

use bazaar_core::OrderNumber;
use bazaar_storefront::Storefront;

use super::{CliError, Result, money};

pub fn list(storefront: &Storefront, limit: Option<usize>) -> Result<()> {
    let orders = match limit {
        Some(n) => storefront.orders().recent(n)?,
        None => storefront.orders().list()?,
    };
    let currency = storefront.config().payee.currency;

    if orders.is_empty() {
        println!("No orders yet");
    }
    for order in orders {
        println!(
            "{:<28} {}  {:<9} {:>10}",
            order.order_number.as_str(),
            order.date.format("%Y-%m-%d %H:%M"),
            order.status.to_string(),
            money(order.total, currency)
        );
    }
    Ok(())
}

pub fn show(storefront: &Storefront, order_number: &str) -> Result<()> {
    let order = storefront
        .orders()
        .get(&OrderNumber::new(order_number))?
        .ok_or_else(|| CliError::Input(format!("Order not found: {order_number}")))?;
    let currency = storefront.config().payee.currency;

    println!("Order {} ({})", order.order_number, order.status);
    println!("Placed {}", order.date.format("%Y-%m-%d %H:%M UTC"));
    if let Some(paid_at) = order.paid_at {
        println!("Paid {}", paid_at.format("%Y-%m-%d %H:%M UTC"));
    }
    for item in &order.items {
        println!(
            "  {:<40} x{:<3} {:>10}",
            item.title,
            item.qty,
            money(item.line_total(), currency)
        );
    }
    println!("Total: {}", money(order.total, currency));
    println!(
        "Deliver to {}, {}",
        order.customer.name,
        order.customer.address.one_line()
    );
    Ok(())
}

/// Push every order to the order store again and wait for the pushes.
pub async fn sync(storefront: &Storefront) -> Result<()> {
    let count = storefront.orders().resync_all()?;
    storefront.gateway().drain().await;
    println!("Pushed {count} orders");
    Ok(())
}
