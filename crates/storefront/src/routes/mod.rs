//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Health check
//!
//! # Checkout
//! POST /api/checkout/order            - Create a pending order
//! POST /api/checkout/payment          - Create a payment preference for an order
//! POST /api/checkout/summary          - Price a cart from catalog data
//! POST /api/checkout/validate-cart    - Total a cart from client prices
//!
//! # Orders
//! GET  /api/orders/{id}               - Order status polling
//!
//! # Catalog
//! GET  /api/products                  - Product listing
//! GET  /api/products/{slug}           - Product detail
//! GET  /api/categories                - Category listing
//! GET  /api/categories/{slug}         - Category detail
//! GET  /api/wc/products               - Product sample
//! GET  /api/wc/{*path}                - WooCommerce read proxy
//!
//! # Webhooks
//! POST /api/webhooks/mercadopago      - Payment notifications
//! ```

pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod wc_proxy;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/order", post(checkout::order::create))
        .route("/payment", post(checkout::payment::create))
        .route("/summary", post(checkout::summary::summarize))
        .route("/validate-cart", post(checkout::validate_cart::validate))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::products))
        .route("/products/{slug}", get(catalog::product))
        .route("/categories", get(catalog::categories))
        .route("/categories/{slug}", get(catalog::category))
        .route("/wc/products", get(catalog::sample))
        .route("/wc/{*path}", get(wc_proxy::proxy))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/checkout", checkout_routes())
        .nest("/api", catalog_routes())
        .route("/api/orders/{id}", get(orders::show))
        .route("/api/webhooks/mercadopago", post(webhooks::mercadopago))
}
