//! Integration tests for `POST /api/webhooks/mercadopago`.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use tienda_core::OrderStatus;
use tienda_integration_tests::{TestApp, WEBHOOK_SECRET};

/// App with order 77 created and payment 555 reported with `status`.
async fn app_with_payment(app: TestApp, status: &str) -> TestApp {
    app.post_json(
        "/api/checkout/order",
        &json!({
            "items": [{ "product_id": 42, "quantity": 1 }],
            "customer": { "email": "ana@example.uy" }
        }),
    )
    .await;
    app.payments.add_payment(json!({
        "id": 555,
        "status": status,
        "external_reference": "77",
        "payer": { "email": "ana@example.uy" }
    }));
    app
}

#[tokio::test]
async fn test_wrong_token_is_unauthorized_and_changes_nothing() {
    let app = app_with_payment(TestApp::with_webhook_secret(), "approved").await;

    for uri in [
        "/api/webhooks/mercadopago?type=payment&id=555&token=wrong",
        "/api/webhooks/mercadopago?type=payment&id=555",
    ] {
        let response = app.post_empty(uri).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(response.body.is_empty());
    }

    assert!(app.commerce.updates().is_empty());
    assert_eq!(app.payments.lookup_count(), 0);
    assert_eq!(app.ledger.len().await, 0);
}

#[tokio::test]
async fn test_correct_token_is_accepted() {
    let app = app_with_payment(TestApp::with_webhook_secret(), "approved").await;

    let response = app
        .post_empty(&format!(
            "/api/webhooks/mercadopago?type=payment&id=555&token={WEBHOOK_SECRET}"
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "ok": true }));
    assert_eq!(app.commerce.order_status(77), Some(OrderStatus::Processing));
}

#[tokio::test]
async fn test_missing_type_or_id_is_acknowledged_without_action() {
    let app = app_with_payment(TestApp::new(), "approved").await;

    for uri in [
        "/api/webhooks/mercadopago",
        "/api/webhooks/mercadopago?type=payment",
        "/api/webhooks/mercadopago?id=555",
    ] {
        let response = app.post_empty(uri).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json(), json!({ "ok": true }));
    }

    assert!(app.commerce.updates().is_empty());
    assert_eq!(app.ledger.len().await, 0);
}

#[tokio::test]
async fn test_duplicate_notification_updates_order_once() {
    let app = app_with_payment(TestApp::new(), "approved").await;
    let uri = "/api/webhooks/mercadopago?type=payment&id=555";

    let first = app.post_empty(uri).await;
    assert_eq!(first.json(), json!({ "ok": true }));

    let second = app.post_empty(uri).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.json(), json!({ "ok": true, "duplicate": true }));

    assert_eq!(app.commerce.updates().len(), 1);
    assert_eq!(app.payments.lookup_count(), 1);
}

#[tokio::test]
async fn test_status_mapping() {
    let cases = [
        ("approved", OrderStatus::Processing),
        ("rejected", OrderStatus::Cancelled),
        ("cancelled", OrderStatus::Cancelled),
        ("pending", OrderStatus::OnHold),
        ("in_process", OrderStatus::OnHold),
        ("charged_back", OrderStatus::OnHold),
    ];

    for (provider_status, expected) in cases {
        let app = app_with_payment(TestApp::new(), provider_status).await;
        app.post_empty("/api/webhooks/mercadopago?type=payment&id=555")
            .await;
        assert_eq!(
            app.commerce.order_status(77),
            Some(expected),
            "provider status {provider_status}"
        );
    }
}

#[tokio::test]
async fn test_payment_metadata_is_recorded() {
    let app = app_with_payment(TestApp::new(), "approved").await;

    app.post_empty("/api/webhooks/mercadopago?topic=payment&data.id=555")
        .await;

    let updates = app.commerce.updates();
    let meta: Vec<(String, serde_json::Value)> = updates[0]
        .1
        .meta_data
        .iter()
        .map(|m| (m.key.clone(), m.value.clone()))
        .collect();
    assert_eq!(
        meta,
        vec![
            ("mp_webhook_status".to_string(), json!("approved")),
            ("mp_webhook_id".to_string(), json!("555")),
            ("mp_webhook_type".to_string(), json!("payment")),
            ("mp_payment_id".to_string(), json!("555")),
            ("mp_payer_email".to_string(), json!("ana@example.uy")),
        ]
    );
}

#[tokio::test]
async fn test_merchant_order_uses_first_payment_status() {
    let app = app_with_payment(TestApp::new(), "pending").await;
    app.payments.add_merchant_order(json!({
        "id": 99,
        "external_reference": "77",
        "payments": [{ "id": 556, "status": "approved" }]
    }));

    let response = app
        .post_empty("/api/webhooks/mercadopago?type=merchant_order&id=99")
        .await;

    assert_eq!(response.json(), json!({ "ok": true }));
    assert_eq!(app.commerce.order_status(77), Some(OrderStatus::Processing));
}

#[tokio::test]
async fn test_unknown_type_falls_back_to_payment_lookup() {
    let app = app_with_payment(TestApp::new(), "rejected").await;

    app.post_empty("/api/webhooks/mercadopago?type=chargebacks&id=555")
        .await;

    assert_eq!(app.commerce.order_status(77), Some(OrderStatus::Cancelled));
}

#[tokio::test]
async fn test_payment_without_reference_is_ignored() {
    let app = TestApp::new();
    app.payments
        .add_payment(json!({ "id": 600, "status": "approved" }));

    let response = app
        .post_empty("/api/webhooks/mercadopago?type=payment&id=600")
        .await;

    assert_eq!(response.json(), json!({ "ok": true, "ignored": true }));
    assert!(app.commerce.updates().is_empty());
}

#[tokio::test]
async fn test_failures_are_acknowledged_and_retried_later() {
    let app = app_with_payment(TestApp::new(), "approved").await;
    let uri = "/api/webhooks/mercadopago?type=payment&id=404";

    let response = app.post_empty(uri).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "ok": true }));
    assert_eq!(app.ledger.len().await, 0);

    // Not recorded, so the next delivery is processed again.
    app.post_empty(uri).await;
    assert_eq!(app.payments.lookup_count(), 2);
}
