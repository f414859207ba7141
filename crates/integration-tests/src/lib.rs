//! Integration tests for the Tienda storefront API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tienda-integration-tests
//! ```
//!
//! Tests drive the full router (middleware included) with
//! `tower::ServiceExt::oneshot`. WooCommerce and MercadoPago are replaced by
//! the recording doubles in this crate, so no network access is needed.
//!
//! # Test Categories
//!
//! - `checkout_order` - Order creation
//! - `checkout_payment` - Payment preference creation
//! - `checkout_pricing` - Cart summary and validation
//! - `webhooks` - Payment notification reconciliation
//! - `catalog` - Catalog reads, proxy and order polling

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::Value;
use tienda_core::{OrderId, OrderStatus, ProductId};
use tienda_storefront::config::StorefrontConfig;
use tienda_storefront::mercadopago::{
    MerchantOrder, Payment, PaymentBackend, PaymentError, Preference, PreferenceRequest,
    ProviderId,
};
use tienda_storefront::services::InMemoryWebhookLedger;
use tienda_storefront::state::AppState;
use tienda_storefront::woocommerce::{
    Category, CommerceBackend, CommerceError, NewOrder, Order, OrderUpdate, Product, ProductQuery,
};

/// Id assigned to the first order the fake backend creates.
pub const FIRST_ORDER_ID: u64 = 77;

/// Webhook secret configured by [`TestApp::with_webhook_secret`].
pub const WEBHOOK_SECRET: &str = "whsec-test-0123456789abcdef";

// =============================================================================
// Commerce double
// =============================================================================

/// In-memory WooCommerce that records every call.
#[derive(Default)]
pub struct FakeCommerce {
    products: Mutex<Vec<Product>>,
    categories: Mutex<Vec<Category>>,
    orders: Mutex<HashMap<OrderId, Order>>,
    raw: Mutex<HashMap<String, Value>>,
    next_order_id: AtomicU64,
    fail_writes: AtomicBool,
    /// Orders submitted to `create_order`.
    pub created: Mutex<Vec<NewOrder>>,
    /// Updates submitted to `update_order`.
    pub updates: Mutex<Vec<(OrderId, OrderUpdate)>>,
    /// Calls to `product_by_id`.
    pub product_lookups: AtomicUsize,
}

impl FakeCommerce {
    pub fn add_product(&self, product: Value) {
        self.products
            .lock()
            .unwrap()
            .push(serde_json::from_value(product).unwrap());
    }

    pub fn add_category(&self, category: Value) {
        self.categories
            .lock()
            .unwrap()
            .push(serde_json::from_value(category).unwrap());
    }

    /// Serve `value` for a proxied `path` (including any query string).
    pub fn add_raw(&self, path: &str, value: Value) {
        self.raw.lock().unwrap().insert(path.to_string(), value);
    }

    /// Make order creation and updates fail with a 500 from the backend.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn updates(&self) -> Vec<(OrderId, OrderUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn order_status(&self, id: u64) -> Option<OrderStatus> {
        self.orders
            .lock()
            .unwrap()
            .get(&OrderId::new(id))
            .map(|o| o.status.clone())
    }

    fn backend_error(path: &str, status: u16) -> CommerceError {
        CommerceError::Status {
            status,
            url: format!("http://woocommerce.test/wp-json/wc/v3{path}"),
        }
    }
}

#[async_trait]
impl CommerceBackend for FakeCommerce {
    async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, CommerceError> {
        let products = self.products.lock().unwrap();
        let limit = query.per_page.map_or(usize::MAX, |n| n as usize);
        Ok(products.iter().take(limit).cloned().collect())
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, CommerceError> {
        self.product_lookups.fetch_add(1, Ordering::SeqCst);
        // Let concurrent lookups overlap, as a network call would.
        tokio::task::yield_now().await;
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, CommerceError> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn categories(&self) -> Result<Vec<Category>, CommerceError> {
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, CommerceError> {
        self.created.lock().unwrap().push(order.clone());
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::backend_error("/orders", 500));
        }

        let id = OrderId::new(FIRST_ORDER_ID + self.next_order_id.fetch_add(1, Ordering::SeqCst));
        let created = Order {
            id,
            status: order.status.clone(),
            total: "0".to_string(),
            currency: "UYU".to_string(),
            line_items: order.line_items.clone(),
            shipping_lines: order.shipping_lines.clone(),
            billing: Some(order.billing.clone()),
            shipping: Some(order.shipping.clone()),
            meta_data: order.meta_data.clone(),
        };
        self.orders.lock().unwrap().insert(id, created.clone());
        Ok(created)
    }

    async fn update_order(
        &self,
        id: OrderId,
        update: &OrderUpdate,
    ) -> Result<Order, CommerceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::backend_error(&format!("/orders/{id}"), 500));
        }
        self.updates.lock().unwrap().push((id, update.clone()));

        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| Self::backend_error(&format!("/orders/{id}"), 404))?;
        if let Some(status) = &update.status {
            order.status = status.clone();
        }
        order.meta_data.extend(update.meta_data.iter().cloned());
        Ok(order.clone())
    }

    async fn order(&self, id: OrderId) -> Result<Order, CommerceError> {
        self.orders
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| Self::backend_error(&format!("/orders/{id}"), 404))
    }

    async fn get_raw(&self, path: &str, query: Option<&str>) -> Result<Value, CommerceError> {
        let key = match query {
            Some(q) if !q.is_empty() => format!("{path}?{q}"),
            _ => path.to_string(),
        };
        self.raw
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| Self::backend_error(&format!("/{key}"), 404))
    }
}

// =============================================================================
// Payment double
// =============================================================================

/// In-memory MercadoPago that records every call.
#[derive(Default)]
pub struct FakePayments {
    payments: Mutex<HashMap<String, Payment>>,
    merchant_orders: Mutex<HashMap<String, MerchantOrder>>,
    fail_preferences: AtomicBool,
    /// Preferences submitted to `create_preference`.
    pub preferences: Mutex<Vec<PreferenceRequest>>,
    /// Calls to `payment` and `merchant_order`.
    pub lookups: AtomicUsize,
}

impl FakePayments {
    pub fn add_payment(&self, payment: Value) {
        let payment: Payment = serde_json::from_value(payment).unwrap();
        self.payments
            .lock()
            .unwrap()
            .insert(payment.id.to_string(), payment);
    }

    pub fn add_merchant_order(&self, order: Value) {
        let order: MerchantOrder = serde_json::from_value(order).unwrap();
        self.merchant_orders
            .lock()
            .unwrap()
            .insert(order.id.to_string(), order);
    }

    pub fn fail_preferences(&self) {
        self.fail_preferences.store(true, Ordering::SeqCst);
    }

    pub fn preferences(&self) -> Vec<PreferenceRequest> {
        self.preferences.lock().unwrap().clone()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentBackend for FakePayments {
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<Preference, PaymentError> {
        if self.fail_preferences.load(Ordering::SeqCst) {
            return Err(PaymentError::Status {
                status: 502,
                operation: "create preference",
            });
        }

        let mut preferences = self.preferences.lock().unwrap();
        preferences.push(request.clone());
        let id = format!("pref-{}", preferences.len());
        Ok(Preference {
            init_point: format!("https://www.mercadopago.test/checkout?pref_id={id}"),
            id: ProviderId::new(id),
            sandbox_init_point: None,
            external_reference: Some(request.external_reference.clone()),
        })
    }

    async fn payment(&self, id: &str) -> Result<Payment, PaymentError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.payments
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(PaymentError::Status {
                status: 404,
                operation: "get payment",
            })
    }

    async fn merchant_order(&self, id: &str) -> Result<MerchantOrder, PaymentError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.merchant_orders
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(PaymentError::Status {
                status: 404,
                operation: "get merchant order",
            })
    }
}

// =============================================================================
// Test application
// =============================================================================

/// The router wired to fresh doubles.
pub struct TestApp {
    pub router: Router,
    pub commerce: Arc<FakeCommerce>,
    pub payments: Arc<FakePayments>,
    pub ledger: Arc<InMemoryWebhookLedger>,
}

/// A collected response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    /// App with no webhook secret and `SITE_URL=https://tienda.test`.
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// App that requires [`WEBHOOK_SECRET`] on notifications.
    pub fn with_webhook_secret() -> Self {
        Self::with_env(&[("MP_WEBHOOK_SECRET", WEBHOOK_SECRET)])
    }

    /// App configured from `vars` on top of the test defaults.
    pub fn with_env(vars: &[(&str, &str)]) -> Self {
        let mut env: HashMap<String, String> = HashMap::from([
            ("SITE_URL".to_string(), "https://tienda.test".to_string()),
            (
                "WP_JSON_URL".to_string(),
                "http://woocommerce.test".to_string(),
            ),
        ]);
        env.extend(vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
        let config = StorefrontConfig::from_lookup(|key| env.get(key).cloned()).unwrap();

        let commerce = Arc::new(FakeCommerce::default());
        let payments = Arc::new(FakePayments::default());
        let ledger = Arc::new(InMemoryWebhookLedger::new());
        let state = AppState::with_backends(
            config,
            commerce.clone(),
            payments.clone(),
            ledger.clone(),
        );

        Self {
            router: tienda_storefront::app(state),
            commerce,
            payments,
            ledger,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        use tower::ServiceExt;

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// POST with an empty body, as MercadoPago notifications are read from
    /// the query string.
    pub async fn post_empty(&self, uri: &str) -> TestResponse {
        self.send(Request::post(uri).body(Body::empty()).unwrap())
            .await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
