//! End-to-end: a persisted cart is restored, edited and sent to checkout.

#![allow(clippy::unwrap_used)]

use std::str::FromStr;

use axum::http::StatusCode;
use kebab_cart::{CART_KEY, CartStore, LEGACY_CART_KEY, MemorySlot};
use kebab_core::{CartLine, Quantity};
use kebab_integration_tests::{Canned, FakeUpstream, TestApp, base_config, with_stripe};
use rust_decimal::Decimal;
use serde_json::{Value, json};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[tokio::test]
async fn test_restored_cart_checks_out() {
    let stripe = FakeUpstream::start(Canned::json(
        StatusCode::OK,
        &json!({"id": "cs_test_e2e", "url": "https://checkout.stripe.com/c/pay/cs_test_e2e"}),
    ))
    .await;
    let app = TestApp::spawn(with_stripe(base_config(), stripe.base_url())).await;

    // A visit to the first storefront left a cart behind
    let slot = MemorySlot::new();
    slot.set(
        LEGACY_CART_KEY,
        r#"[{"id":"burger-1","nom":"Classic","prix":8.5,"image":null,"qty":1}]"#,
    );

    let mut cart = CartStore::open(slot.clone());
    cart.add(CartLine::new("burger-1", "Classic", dec("8.5"), Quantity::new(2).unwrap()).unwrap());
    cart.add(
        CartLine::new("drink-ayran", "Ayran", dec("2.49"), Quantity::ONE)
            .unwrap()
            .with_image("/img/ayran.webp"),
    );
    cart.decrement("drink-ayran");
    cart.add(CartLine::new("fries", "Pommes", dec("3.90"), Quantity::ONE).unwrap());

    assert_eq!(cart.item_count(), 4);
    assert_eq!(cart.subtotal(), dec("29.40"));
    assert_eq!(cart.total(), dec("31.90"));

    let request = cart.checkout_request(Some("guest@example.com")).unwrap();
    let resp = app
        .post_json(
            "/api/create-checkout-session",
            &serde_json::to_value(&request).unwrap(),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["url"], "https://checkout.stripe.com/c/pay/cs_test_e2e");

    let sent = &stripe.requests()[0];
    assert_eq!(
        sent.form_value("line_items[0][price_data][product_data][name]")
            .as_deref(),
        Some("Classic")
    );
    assert_eq!(
        sent.form_value("line_items[0][price_data][unit_amount]")
            .as_deref(),
        Some("850")
    );
    assert_eq!(sent.form_value("line_items[0][quantity]").as_deref(), Some("3"));
    assert_eq!(
        sent.form_value("line_items[1][price_data][unit_amount]")
            .as_deref(),
        Some("390")
    );
    assert_eq!(sent.form_value("line_items[2][quantity]"), None);

    // The page that returns from Stripe clears the cart
    cart.clear();
    assert_eq!(slot.get(CART_KEY).as_deref(), Some("[]"));
    assert!(CartStore::open(slot).is_empty());
}
