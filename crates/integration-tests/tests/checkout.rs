//! Integration tests for checkout session creation.
//!
//! The storefront is pointed at a fake Stripe that records the form it
//! receives, so the tests check both what the browser gets back and what
//! would have been sent to Stripe.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use kebab_integration_tests::{
    Canned, FakeUpstream, STRIPE_TEST_KEY, TestApp, base_config, closed_url, with_stripe,
};
use serde_json::{Value, json};

const CHECKOUT: &str = "/api/create-checkout-session";

fn session_created() -> Canned {
    Canned::json(
        StatusCode::OK,
        &json!({
            "id": "cs_test_a1B2c3",
            "object": "checkout.session",
            "url": "https://checkout.stripe.com/c/pay/cs_test_a1B2c3"
        }),
    )
}

fn two_item_cart() -> Value {
    json!({
        "items": [
            {"name": "Classic Döner", "amount": 850, "quantity": 3},
            {"name": "Ayran", "amount": 250, "quantity": 1}
        ],
        "customerEmail": "guest@example.com"
    })
}

async fn app_with_stripe(stripe: &FakeUpstream) -> TestApp {
    TestApp::spawn(with_stripe(base_config(), stripe.base_url())).await
}

#[tokio::test]
async fn test_checkout_returns_session_url() {
    let stripe = FakeUpstream::start(session_created()).await;
    let app = app_with_stripe(&stripe).await;

    let resp = app
        .client()
        .post(app.url(CHECKOUT))
        .header("X-Forwarded-Proto", "https")
        .header("X-Forwarded-Host", "kebab.example")
        .json(&two_item_cart())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({"url": "https://checkout.stripe.com/c/pay/cs_test_a1B2c3"})
    );

    let requests = stripe.requests();
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    assert_eq!(sent.path, "/v1/checkout/sessions");
    assert_eq!(
        sent.header("authorization"),
        Some(format!("Bearer {STRIPE_TEST_KEY}").as_str())
    );
    assert_eq!(sent.header("stripe-version"), Some("2025-09-30.clover"));

    assert_eq!(sent.form_value("mode").as_deref(), Some("payment"));
    assert_eq!(
        sent.form_value("payment_method_types[0]").as_deref(),
        Some("card")
    );
    assert_eq!(
        sent.form_value("line_items[0][price_data][currency]").as_deref(),
        Some("eur")
    );
    assert_eq!(
        sent.form_value("line_items[0][price_data][product_data][name]")
            .as_deref(),
        Some("Classic Döner")
    );
    assert_eq!(
        sent.form_value("line_items[0][price_data][unit_amount]")
            .as_deref(),
        Some("850")
    );
    assert_eq!(
        sent.form_value("line_items[0][quantity]").as_deref(),
        Some("3")
    );
    assert_eq!(
        sent.form_value("line_items[1][price_data][unit_amount]")
            .as_deref(),
        Some("250")
    );
    assert_eq!(
        sent.form_value("success_url").as_deref(),
        Some("https://kebab.example/?payment=success")
    );
    assert_eq!(
        sent.form_value("cancel_url").as_deref(),
        Some("https://kebab.example/?payment=cancelled")
    );
    assert_eq!(
        sent.form_value("customer_email").as_deref(),
        Some("guest@example.com")
    );
}

#[tokio::test]
async fn test_checkout_callback_urls_from_forwarded_host() {
    let stripe = FakeUpstream::start(session_created()).await;
    let app = app_with_stripe(&stripe).await;

    let resp = app
        .client()
        .post(app.url(CHECKOUT))
        .header("X-Forwarded-Proto", "https")
        .header("X-Forwarded-Host", "order.kebab.example")
        .json(&json!({"items": [{"name": "Falafel", "amount": 700, "quantity": 1}]}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let sent = &stripe.requests()[0];
    assert_eq!(
        sent.form_value("cancel_url").as_deref(),
        Some("https://order.kebab.example/?payment=cancelled")
    );
    assert_eq!(sent.form_value("customer_email"), None);
}

#[tokio::test]
async fn test_cross_origin_caller_cannot_redirect_callbacks() {
    let stripe = FakeUpstream::start(session_created()).await;
    let app = app_with_stripe(&stripe).await;

    let resp = app
        .client()
        .post(app.url(CHECKOUT))
        .header("Origin", "https://attacker.example")
        .header("X-Forwarded-Host", "order.kebab.example")
        .json(&two_item_cart())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let sent = &stripe.requests()[0];
    assert_eq!(
        sent.form_value("success_url").as_deref(),
        Some("http://order.kebab.example/?payment=success")
    );
    assert_eq!(
        sent.form_value("cancel_url").as_deref(),
        Some("http://order.kebab.example/?payment=cancelled")
    );
}

#[tokio::test]
async fn test_blank_email_is_treated_as_absent() {
    let stripe = FakeUpstream::start(session_created()).await;
    let app = app_with_stripe(&stripe).await;

    let resp = app
        .post_json(
            CHECKOUT,
            &json!({
                "items": [{"name": "Falafel", "amount": 700, "quantity": 1}],
                "customerEmail": "   "
            }),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(stripe.requests()[0].form_value("customer_email"), None);
}

#[tokio::test]
async fn test_invalid_carts_never_reach_stripe() {
    let stripe = FakeUpstream::start(session_created()).await;
    let app = app_with_stripe(&stripe).await;

    let too_many: Vec<Value> = (0..101)
        .map(|i| json!({"name": format!("Dish {i}"), "amount": 100, "quantity": 1}))
        .collect();

    let invalid = [
        json!({}),
        json!({"items": []}),
        json!({"items": [{"name": "  ", "amount": 850, "quantity": 1}]}),
        json!({"items": [{"name": "Classic", "amount": 0, "quantity": 1}]}),
        json!({"items": [{"name": "Classic", "amount": -850, "quantity": 1}]}),
        json!({"items": [{"name": "Classic", "amount": 850, "quantity": 0}]}),
        json!({"items": [{"name": "Classic", "amount": 850, "quantity": 1}], "customerEmail": "not-an-email"}),
        json!({"items": too_many}),
    ];

    for body in &invalid {
        let resp = app.post_json(CHECKOUT, body).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let error: Value = resp.json().await.unwrap();
        assert!(error["message"].is_string(), "body: {body}");
    }

    assert_eq!(stripe.request_count(), 0);
}

#[tokio::test]
async fn test_stripe_rejection_message_is_relayed() {
    let stripe = FakeUpstream::start(Canned::json(
        StatusCode::BAD_REQUEST,
        &json!({
            "error": {
                "message": "Amount must convert to at least 50 cents.",
                "type": "invalid_request_error"
            }
        }),
    ))
    .await;
    let app = app_with_stripe(&stripe).await;

    let resp = app.post_json(CHECKOUT, &two_item_cart()).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({"message": "Amount must convert to at least 50 cents."})
    );
}

#[tokio::test]
async fn test_stripe_outage_is_server_error() {
    let stripe = FakeUpstream::start(Canned::raw(
        StatusCode::BAD_GATEWAY,
        "<html><body>upstream connect error</body></html>",
    ))
    .await;
    let app = app_with_stripe(&stripe).await;

    let resp = app.post_json(CHECKOUT, &two_item_cart()).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("502"));
    assert!(!message.contains("<html>"));
}

#[tokio::test]
async fn test_session_without_url_is_server_error() {
    let stripe = FakeUpstream::start(Canned::json(
        StatusCode::OK,
        &json!({"id": "cs_test_nourl", "url": null}),
    ))
    .await;
    let app = app_with_stripe(&stripe).await;

    let resp = app.post_json(CHECKOUT, &two_item_cart()).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({"message": "Payment provider returned no checkout URL"})
    );
}

#[tokio::test]
async fn test_unreachable_stripe_hides_transport_error() {
    let api_base = closed_url().await;
    let app = TestApp::spawn(with_stripe(base_config(), &api_base)).await;

    let resp = app.post_json(CHECKOUT, &two_item_cart()).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"message": "Payment provider unreachable"}));
}

#[tokio::test]
async fn test_slow_stripe_times_out() {
    let stripe = FakeUpstream::start(session_created().delayed(Duration::from_secs(5))).await;
    let mut config = with_stripe(base_config(), stripe.base_url());
    config.outbound_timeout = Duration::from_millis(300);
    let app = TestApp::spawn(config).await;

    let resp = app.post_json(CHECKOUT, &two_item_cart()).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"message": "Payment provider timed out"}));
}
