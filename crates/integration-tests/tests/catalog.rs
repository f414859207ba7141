//! Integration tests for catalog reads, the WooCommerce proxy, order polling
//! and the middleware stack.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use tienda_integration_tests::TestApp;

fn app_with_catalog() -> TestApp {
    let app = TestApp::new();
    for id in 1..=7 {
        app.commerce.add_product(json!({
            "id": id,
            "name": format!("Producto {id}"),
            "slug": format!("producto-{id}"),
            "price": "100"
        }));
    }
    app.commerce
        .add_category(json!({ "id": 15, "name": "Mates", "slug": "mates", "image": null }));
    app
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"ok");
}

#[tokio::test]
async fn test_product_sample_is_limited_to_five() {
    let app = app_with_catalog();

    let body = app.get("/api/wc/products").await.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["count"], 5);
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_product_listing_and_detail() {
    let app = app_with_catalog();

    let body = app.get("/api/products?per_page=3&featured=true").await.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 3);

    let response = app.get("/api/products/producto-2").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["product"]["id"], 2);

    let response = app.get("/api/products/no-existe").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "ok": false, "error": "Not found" }));
}

#[tokio::test]
async fn test_categories() {
    let app = app_with_catalog();

    let body = app.get("/api/categories").await.json();
    assert_eq!(body["items"][0]["slug"], "mates");

    let response = app.get("/api/categories/mates").await;
    assert_eq!(response.json()["category"]["id"], 15);
    assert_eq!(
        app.get("/api/categories/termos").await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_proxy_success_is_cacheable() {
    let app = TestApp::new();
    app.commerce
        .add_raw("products/tags?per_page=10", json!([{ "id": 3, "name": "oferta" }]));

    let response = app.get("/api/wc/products/tags?per_page=10").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header("cache-control"),
        Some("public, s-maxage=300, stale-while-revalidate=600")
    );
    assert_eq!(response.header("cdn-cache-control"), Some("public, s-maxage=300"));
    assert_eq!(response.json()[0]["name"], "oferta");
}

#[tokio::test]
async fn test_proxy_passes_upstream_status() {
    let app = TestApp::new();

    let response = app.get("/api/wc/coupons").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.json(),
        json!({ "error": "WooCommerce API error: 404" })
    );
}

#[tokio::test]
async fn test_order_polling() {
    let app = TestApp::new();
    app.post_json(
        "/api/checkout/order",
        &json!({
            "items": [{ "product_id": 42 }],
            "customer": { "email": "ana@example.uy" }
        }),
    )
    .await;

    let response = app.get("/api/orders/77").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["order"]["id"], 77);
    assert_eq!(body["order"]["status"], "pending");

    for uri in ["/api/orders/78", "/api/orders/abc"] {
        let response = app.get(uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.json(), json!({ "ok": false, "error": "Not found" }));
    }
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = TestApp::new();

    let response = app.get("/api/orders/1").await;

    assert!(response.header("x-request-id").is_some());
    assert_eq!(response.header("x-content-type-options"), Some("nosniff"));
    assert_eq!(response.header("cache-control"), Some("no-store"));
}
