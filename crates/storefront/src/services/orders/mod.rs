//! Order lifecycle manager.
//!
//! Orders are created `pending` from the cart and move to `confirmed` when the
//! customer says they paid. That is the only transition. Every change is saved
//! locally first and then handed to the [`OrderPublisher`]; publishing never
//! affects the local outcome.

mod error;

pub use error::OrderError;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::instrument;

use bazaar_core::{CustomerSnapshot, Order, OrderItem, OrderNumber, OrderStatus};

use crate::clock::Clock;
use crate::config::PayeeConfig;
use crate::models::Cart;
use crate::services::catalog::CatalogLookup;
use crate::services::payment::PaymentRequest;
use crate::services::sync::OrderPublisher;
use crate::store::{LocalStore, LocalStoreExt, StoreKey};

/// Order numbers tried before giving up on a collision-free one.
const MAX_NUMBER_ATTEMPTS: usize = 16;

/// Result of a confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The order moved from pending to confirmed.
    Confirmed(Order),
    /// The order was confirmed before; nothing changed.
    AlreadyConfirmed(Order),
}

impl ConfirmOutcome {
    #[must_use]
    pub const fn order(&self) -> &Order {
        match self {
            Self::Confirmed(order) | Self::AlreadyConfirmed(order) => order,
        }
    }

    #[must_use]
    pub fn into_order(self) -> Order {
        match self {
            Self::Confirmed(order) | Self::AlreadyConfirmed(order) => order,
        }
    }
}

/// Creates, confirms and lists the device's orders.
#[derive(Clone)]
pub struct OrderManager {
    store: Arc<dyn LocalStore>,
    publisher: Arc<dyn OrderPublisher>,
    clock: Arc<dyn Clock>,
    payee: PayeeConfig,
}

impl OrderManager {
    #[must_use]
    pub fn new(
        store: Arc<dyn LocalStore>,
        publisher: Arc<dyn OrderPublisher>,
        clock: Arc<dyn Clock>,
        payee: PayeeConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            clock,
            payee,
        }
    }

    /// Create a pending order from `cart`.
    ///
    /// Lines whose product is not in the catalog are left out. Prices and
    /// titles are copied from the catalog as they are now.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` if no line resolves to a product.
    #[instrument(skip_all, fields(lines = cart.lines().len()))]
    pub fn create_order(
        &self,
        cart: &Cart,
        catalog: &dyn CatalogLookup,
        customer: CustomerSnapshot,
    ) -> Result<Order, OrderError> {
        let items: Vec<OrderItem> = cart
            .lines()
            .iter()
            .filter_map(|line| {
                let product = catalog.find(&line.id)?;
                Some(OrderItem {
                    id: product.id.clone(),
                    title: product.title.clone(),
                    price: product.price,
                    qty: line.qty,
                })
            })
            .collect();

        if items.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        if items.len() < cart.lines().len() {
            tracing::debug!(
                skipped = cart.lines().len() - items.len(),
                "Cart lines missing from catalog"
            );
        }

        let mut orders = self.orders()?;
        let now = self.clock.now();
        let order_number = unique_number(&orders, now, &mut rand::rng())?;
        let order = Order::new(order_number, now, items, customer);

        orders.push(order.clone());
        self.store.save(StoreKey::Orders, &orders)?;

        tracing::info!(order_number = %order.order_number, total = %order.total, "Order created");
        self.publisher.publish_pending(&order);
        Ok(order)
    }

    /// Reopen payment for a pending order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` for an unknown number and
    /// `OrderError::AlreadySettled` if the order is confirmed.
    #[instrument(skip(self))]
    pub fn resume(&self, order_number: &OrderNumber) -> Result<(Order, PaymentRequest), OrderError> {
        let order = self
            .get(order_number)?
            .ok_or_else(|| OrderError::OrderNotFound(order_number.clone()))?;
        if order.status.is_settled() {
            return Err(OrderError::AlreadySettled(order.order_number));
        }

        let request = self.payment_request(&order);
        Ok((order, request))
    }

    /// Mark an order paid.
    ///
    /// Confirming a confirmed order changes and publishes nothing.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` for an unknown number.
    #[instrument(skip(self))]
    pub fn confirm(&self, order_number: &OrderNumber) -> Result<ConfirmOutcome, OrderError> {
        let mut orders = self.orders()?;
        let order = orders
            .iter_mut()
            .find(|order| &order.order_number == order_number)
            .ok_or_else(|| OrderError::OrderNotFound(order_number.clone()))?;

        if !order.confirm(self.clock.now()) {
            return Ok(ConfirmOutcome::AlreadyConfirmed(order.clone()));
        }
        let confirmed = order.clone();
        self.store.save(StoreKey::Orders, &orders)?;

        tracing::info!(order_number = %confirmed.order_number, "Order confirmed");
        self.publisher.publish_confirmed(&confirmed);
        Ok(ConfirmOutcome::Confirmed(confirmed))
    }

    /// # Errors
    ///
    /// Returns `OrderError::Store` if the stored orders cannot be read.
    pub fn get(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderError> {
        Ok(self
            .orders()?
            .into_iter()
            .find(|order| &order.order_number == order_number))
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Store` if the stored orders cannot be read.
    pub fn list(&self) -> Result<Vec<Order>, OrderError> {
        let mut orders = self.orders()?;
        orders.reverse();
        orders.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(orders)
    }

    /// The `n` newest orders.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Store` if the stored orders cannot be read.
    pub fn recent(&self, n: usize) -> Result<Vec<Order>, OrderError> {
        let mut orders = self.list()?;
        orders.truncate(n);
        Ok(orders)
    }

    /// Publish every order again in its current state. Returns how many were
    /// handed to the publisher.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Store` if the stored orders cannot be read.
    #[instrument(skip(self))]
    pub fn resync_all(&self) -> Result<usize, OrderError> {
        let orders = self.orders()?;
        for order in &orders {
            match order.status {
                OrderStatus::Pending => self.publisher.publish_pending(order),
                OrderStatus::Confirmed => self.publisher.publish_confirmed(order),
            }
        }
        tracing::info!(count = orders.len(), "Orders queued for resync");
        Ok(orders.len())
    }

    /// The payment link for `order`.
    #[must_use]
    pub fn payment_request(&self, order: &Order) -> PaymentRequest {
        PaymentRequest::for_order(order, &self.payee)
    }

    fn orders(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.load_or_default(StoreKey::Orders)?)
    }
}

/// Generate an order number not already used in `orders`.
fn unique_number<R: Rng + ?Sized>(
    orders: &[Order],
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<OrderNumber, OrderError> {
    for _ in 0..MAX_NUMBER_ATTEMPTS {
        let candidate = OrderNumber::generate(now, rng);
        if !orders.iter().any(|order| order.order_number == candidate) {
            return Ok(candidate);
        }
        tracing::debug!(order_number = %candidate, "Order number collision");
    }
    Err(OrderError::NumberSpaceExhausted)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;

    use chrono::{Duration, TimeZone};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rust_decimal::Decimal;

    use super::*;
    use crate::clock::ManualClock;
    use crate::services::catalog::Catalog;
    use crate::store::MemoryStore;
    use bazaar_core::{AddressFields, CurrencyCode, Email, Product, ProductId};

    #[derive(Default)]
    struct RecordingPublisher {
        pushes: Mutex<Vec<(OrderStatus, OrderNumber)>>,
    }

    impl RecordingPublisher {
        fn pushes(&self) -> Vec<(OrderStatus, OrderNumber)> {
            self.pushes.lock().unwrap().clone()
        }
    }

    impl OrderPublisher for RecordingPublisher {
        fn publish_pending(&self, order: &Order) {
            self.pushes
                .lock()
                .unwrap()
                .push((OrderStatus::Pending, order.order_number.clone()));
        }

        fn publish_confirmed(&self, order: &Order) {
            self.pushes
                .lock()
                .unwrap()
                .push((OrderStatus::Confirmed, order.order_number.clone()));
        }
    }

    struct Fixture {
        manager: OrderManager,
        publisher: Arc<RecordingPublisher>,
        clock: Arc<ManualClock>,
        catalog: Catalog,
    }

    fn product(id: &str, price: &str) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Product {id}"),
            "price": price,
        }))
        .unwrap()
    }

    fn customer() -> CustomerSnapshot {
        CustomerSnapshot {
            name: "Asha".to_owned(),
            email: Email::parse("asha@example.in").unwrap(),
            mobile: "+919876543210".to_owned(),
            address: AddressFields {
                street: "1 Park St".to_owned(),
                apartment: None,
                city: "Kolkata".to_owned(),
                state: "WB".to_owned(),
                postal_code: "700016".to_owned(),
                country: "India".to_owned(),
            },
        }
    }

    fn fixture() -> Fixture {
        let publisher = Arc::new(RecordingPublisher::default());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
        ));
        let manager = OrderManager::new(
            Arc::new(MemoryStore::new()),
            publisher.clone(),
            clock.clone(),
            PayeeConfig {
                vpa: "shop@okaxis".to_owned(),
                name: "Corner Shop".to_owned(),
                currency: CurrencyCode::INR,
            },
        );
        Fixture {
            manager,
            publisher,
            clock,
            catalog: Catalog::new(vec![product("P1", "100"), product("P2", "49.50")]),
        }
    }

    fn cart(lines: &[(&str, u32)]) -> Cart {
        let mut cart = Cart::default();
        for (id, qty) in lines {
            cart.add(&ProductId::new(*id), *qty);
        }
        cart
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_create_order_totals_and_publishes_pending() {
        let f = fixture();
        let order = f
            .manager
            .create_order(&cart(&[("P1", 2)]), &f.catalog, customer())
            .unwrap();

        assert_eq!(order.total, dec("200.00"));
        assert_eq!(order.total.to_string(), "200.00");
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.order_number.as_str().starts_with("ORD-1740823200000-"));
        assert_eq!(
            f.publisher.pushes(),
            vec![(OrderStatus::Pending, order.order_number.clone())]
        );
        assert_eq!(f.manager.get(&order.order_number).unwrap(), Some(order));
    }

    #[test]
    fn test_missing_products_are_skipped() {
        let f = fixture();
        let order = f
            .manager
            .create_order(&cart(&[("P1", 1), ("GONE", 1)]), &f.catalog, customer())
            .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total, dec("100.00"));
    }

    #[test]
    fn test_empty_or_unresolvable_cart_is_rejected() {
        let f = fixture();
        for lines in [&[][..], &[("GONE", 2)][..]] {
            assert!(matches!(
                f.manager.create_order(&cart(lines), &f.catalog, customer()),
                Err(OrderError::EmptyCart)
            ));
        }
        assert!(f.manager.list().unwrap().is_empty());
        assert!(f.publisher.pushes().is_empty());
    }

    #[test]
    fn test_confirm_is_idempotent() {
        let f = fixture();
        let order = f
            .manager
            .create_order(&cart(&[("P2", 2)]), &f.catalog, customer())
            .unwrap();

        f.clock.advance(Duration::minutes(3));
        let first = f.manager.confirm(&order.order_number).unwrap();
        let ConfirmOutcome::Confirmed(confirmed) = first else {
            panic!("expected first confirmation");
        };
        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert_eq!(confirmed.paid_at, Some(f.clock.now()));
        assert_eq!(confirmed.date, order.date);

        f.clock.advance(Duration::minutes(3));
        let second = f.manager.confirm(&order.order_number).unwrap();
        assert_eq!(second, ConfirmOutcome::AlreadyConfirmed(confirmed.clone()));
        assert_eq!(f.manager.get(&order.order_number).unwrap(), Some(confirmed));
        assert_eq!(f.publisher.pushes().len(), 2);
    }

    #[test]
    fn test_unknown_order() {
        let f = fixture();
        let missing = OrderNumber::new("ORD-0-NOPE");
        assert!(matches!(
            f.manager.confirm(&missing),
            Err(OrderError::OrderNotFound(_))
        ));
        assert!(matches!(
            f.manager.resume(&missing),
            Err(OrderError::OrderNotFound(_))
        ));
    }

    #[test]
    fn test_resume_pending_only() {
        let f = fixture();
        let order = f
            .manager
            .create_order(&cart(&[("P1", 1)]), &f.catalog, customer())
            .unwrap();

        let (resumed, request) = f.manager.resume(&order.order_number).unwrap();
        assert_eq!(resumed, order);
        assert!(request.uri().contains("&am=100.00&"));
        assert!(request.uri().contains(order.order_number.as_str()));

        f.manager.confirm(&order.order_number).unwrap();
        assert!(matches!(
            f.manager.resume(&order.order_number),
            Err(OrderError::AlreadySettled(_))
        ));
    }

    #[test]
    fn test_list_newest_first_and_resync() {
        let f = fixture();
        let first = f
            .manager
            .create_order(&cart(&[("P1", 1)]), &f.catalog, customer())
            .unwrap();
        f.clock.advance(Duration::hours(1));
        let second = f
            .manager
            .create_order(&cart(&[("P2", 1)]), &f.catalog, customer())
            .unwrap();
        f.manager.confirm(&first.order_number).unwrap();

        let numbers: Vec<OrderNumber> = f
            .manager
            .list()
            .unwrap()
            .into_iter()
            .map(|o| o.order_number)
            .collect();
        assert_eq!(numbers, vec![second.order_number.clone(), first.order_number.clone()]);
        assert_eq!(f.manager.recent(1).unwrap().len(), 1);

        let before = f.publisher.pushes().len();
        assert_eq!(f.manager.resync_all().unwrap(), 2);
        let resynced = f.publisher.pushes().split_off(before);
        assert!(resynced.contains(&(OrderStatus::Confirmed, first.order_number)));
        assert!(resynced.contains(&(OrderStatus::Pending, second.order_number)));
    }

    #[test]
    fn test_number_collision_regenerates() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let taken = OrderNumber::generate(now, &mut StdRng::seed_from_u64(7));
        let existing = Order::new(taken.clone(), now, Vec::new(), customer());

        let fresh = unique_number(&[existing], now, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_ne!(fresh, taken);
    }
}
