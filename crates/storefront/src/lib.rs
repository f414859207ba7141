//! Tienda storefront API library.
//!
//! Headless checkout service in front of WooCommerce (catalog and orders) and
//! MercadoPago (payments). The binary in `main.rs` wires configuration,
//! logging and Sentry around [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod mercadopago;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod woocommerce;

use axum::{Router, middleware::from_fn, routing::get};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router with its middleware stack.
///
/// Sentry layers are added by the binary so tests can drive the router
/// without a Sentry hub.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backends.
async fn health() -> &'static str {
    "ok"
}
