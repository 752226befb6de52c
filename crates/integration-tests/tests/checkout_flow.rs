//! The storefront engine placing and paying for an order against a live
//! order store.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde_json::{Value, json};

use bazaar_core::{AddressFields, AddressKind, OrderNumber, OrderStatus, Product, ProductId};
use bazaar_integration_tests::OrderStore;
use bazaar_storefront::Storefront;
use bazaar_storefront::clock::ManualClock;
use bazaar_storefront::config::StorefrontConfig;
use bazaar_storefront::services::addresses::NewAddress;
use bazaar_storefront::services::catalog::Catalog;
use bazaar_storefront::services::checkout::{
    AddressChoice, CheckoutRequest, ContactDetails, PromptOrigin,
};
use bazaar_storefront::services::identity::DemoDelivery;
use bazaar_storefront::services::orders::ConfirmOutcome;
use bazaar_storefront::services::payment::{FixedChannel, LinkRenderer, PaymentChannel};
use bazaar_storefront::services::sync::SyncGateway;
use bazaar_storefront::store::MemoryStore;

const MOBILE: &str = "+919876543210";

fn storefront(store: &OrderStore) -> Storefront {
    let vars: HashMap<&str, String> = HashMap::from([
        ("BAZAAR_UPI_VPA", "shop@okaxis".to_owned()),
        ("BAZAAR_UPI_PAYEE_NAME", "Corner Shop".to_owned()),
        ("BAZAAR_ORDER_API_URL", store.base_url.to_string()),
    ]);
    let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());

    Storefront::with_parts(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(clock),
        SyncGateway::new(store.base_url.clone()),
    )
}

fn catalog() -> Catalog {
    let products: Vec<Product> = serde_json::from_value(json!([
        {"id": "TEA-1", "title": "Assam Tea", "price": "150", "category": "Tea"},
        {"id": "HNY-1", "title": "Forest Honey", "price": "99.50", "category": "Pantry"}
    ]))
    .unwrap();
    Catalog::new(products)
}

fn sign_in(storefront: &Storefront) {
    let identity = storefront.identity();
    let channel = DemoDelivery::new();
    identity.request_code(MOBILE, &channel).unwrap();
    let verified = identity
        .verify_code(MOBILE, &channel.last_code().unwrap())
        .unwrap();
    identity
        .complete_profile(verified, "Asha Rao", "asha@example.in")
        .unwrap();
}

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        address: AddressChoice::New(NewAddress {
            kind: AddressKind::Home,
            fields: AddressFields {
                street: "1 Park St".to_owned(),
                apartment: None,
                city: "Kolkata".to_owned(),
                state: "WB".to_owned(),
                postal_code: "700016".to_owned(),
                country: "India".to_owned(),
            },
            make_default: true,
        }),
        contact: ContactDetails {
            name: "Asha Rao".to_owned(),
            email: "asha@example.in".to_owned(),
            mobile: MOBILE.to_owned(),
        },
    }
}

async fn remote_order(store: &OrderStore, number: &OrderNumber) -> Value {
    Client::new()
        .get(store.url(&format!("api/orders/{number}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_order_reaches_store_pending_then_confirmed() {
    let store = OrderStore::start().await;
    let shop = storefront(&store);
    let catalog = catalog();
    sign_in(&shop);

    shop.cart().add_item(&ProductId::new("TEA-1"), 2).unwrap();
    shop.cart().add_item(&ProductId::new("HNY-1"), 1).unwrap();

    let checkout = shop.checkout(
        Arc::new(FixedChannel(PaymentChannel::DeepLink)),
        Arc::new(LinkRenderer),
    );
    let prompt = checkout.place_order(checkout_request(), &catalog).unwrap();
    assert_eq!(prompt.origin, PromptOrigin::NewOrder);
    assert_eq!(prompt.order.status, OrderStatus::Pending);
    assert!(prompt.artifact.uri().contains("am=399.50"));

    shop.gateway().drain().await;
    let remote = remote_order(&store, &prompt.order.order_number).await;
    assert_eq!(remote["status"], "pending");
    assert_eq!(remote["items"].as_array().unwrap().len(), 2);
    assert_eq!(remote["customer"]["city"], "Kolkata");

    let outcome = checkout.complete_payment(&prompt).unwrap();
    assert!(matches!(outcome, ConfirmOutcome::Confirmed(_)));
    assert!(shop.cart().cart().unwrap().is_empty());

    shop.gateway().drain().await;
    let remote = remote_order(&store, &prompt.order.order_number).await;
    assert_eq!(remote["status"], "confirmed");
    assert!(remote["paidAt"].is_string());
    assert!(remote["confirmedAt"].is_string());
}

#[tokio::test]
async fn test_resumed_payment_keeps_cart() {
    let store = OrderStore::start().await;
    let shop = storefront(&store);
    let catalog = catalog();
    sign_in(&shop);

    shop.cart().add_item(&ProductId::new("TEA-1"), 1).unwrap();
    let checkout = shop.checkout(
        Arc::new(FixedChannel(PaymentChannel::ScannableCode)),
        Arc::new(LinkRenderer),
    );
    let placed = checkout.place_order(checkout_request(), &catalog).unwrap();

    // Shopper came back later with something new in the cart.
    shop.cart().add_item(&ProductId::new("HNY-1"), 3).unwrap();

    let resumed = checkout
        .resume_payment(&placed.order.order_number)
        .unwrap();
    assert_eq!(resumed.origin, PromptOrigin::Resumed);
    assert_eq!(resumed.order.total, placed.order.total);

    checkout.complete_payment(&resumed).unwrap();
    assert!(!shop.cart().cart().unwrap().is_empty());

    shop.gateway().drain().await;
    let remote = remote_order(&store, &placed.order.order_number).await;
    assert_eq!(remote["status"], "confirmed");
}

#[tokio::test]
async fn test_resync_pushes_every_order() {
    let store = OrderStore::start().await;
    let shop = storefront(&store);
    let catalog = catalog();
    sign_in(&shop);

    let checkout = shop.checkout(
        Arc::new(FixedChannel(PaymentChannel::DeepLink)),
        Arc::new(LinkRenderer),
    );
    let mut numbers = Vec::new();
    for _ in 0..2 {
        shop.cart().add_item(&ProductId::new("TEA-1"), 1).unwrap();
        let prompt = checkout.place_order(checkout_request(), &catalog).unwrap();
        checkout.complete_payment(&prompt).unwrap();
        numbers.push(prompt.order.order_number);
    }
    shop.gateway().drain().await;

    assert_eq!(shop.orders().resync_all().unwrap(), 2);
    shop.gateway().drain().await;

    for number in &numbers {
        assert_eq!(remote_order(&store, number).await["status"], "confirmed");
    }
}
