//! Application state shared across handlers.

use std::sync::Arc;

use moka::future::Cache;
use tienda_core::ProductId;

use crate::cache::MokaResponseCache;
use crate::config::StorefrontConfig;
use crate::mercadopago::{MercadoPagoClient, PaymentBackend, PaymentError};
use crate::services::{InMemoryWebhookLedger, WebhookLedger};
use crate::woocommerce::{CommerceBackend, CommerceError, Product, WooCommerceClient};

/// Capacity of the product cache used when pricing carts.
const SUMMARY_CACHE_CAPACITY: u64 = 1000;

/// Error building backend clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("commerce client: {0}")]
    Commerce(#[from] CommerceError),
    #[error("payment client: {0}")]
    Payment(#[from] PaymentError),
}

/// Why a product could not be priced.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProductLookupError {
    #[error("product not found")]
    NotFound,
    #[error(transparent)]
    Commerce(#[from] CommerceError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    commerce: Arc<dyn CommerceBackend>,
    payments: Arc<dyn PaymentBackend>,
    webhook_ledger: Arc<dyn WebhookLedger>,
    product_cache: Cache<ProductId, Product>,
}

impl AppState {
    /// Create application state with the HTTP clients described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client fails to build.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let response_cache = Arc::new(MokaResponseCache::new(
            config.woocommerce.cache_capacity,
            config.woocommerce.cache_ttl,
        ));
        let commerce = WooCommerceClient::new(&config.woocommerce, response_cache)?;
        let payments = MercadoPagoClient::new(&config.mercadopago)?;

        Ok(Self::with_backends(
            config,
            Arc::new(commerce),
            Arc::new(payments),
            Arc::new(InMemoryWebhookLedger::new()),
        ))
    }

    /// Create application state around existing backends.
    #[must_use]
    pub fn with_backends(
        config: StorefrontConfig,
        commerce: Arc<dyn CommerceBackend>,
        payments: Arc<dyn PaymentBackend>,
        webhook_ledger: Arc<dyn WebhookLedger>,
    ) -> Self {
        let product_cache = Cache::builder()
            .max_capacity(SUMMARY_CACHE_CAPACITY)
            .time_to_live(config.summary_cache_ttl)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                commerce,
                payments,
                webhook_ledger,
                product_cache,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the WooCommerce backend.
    #[must_use]
    pub fn commerce(&self) -> &dyn CommerceBackend {
        self.inner.commerce.as_ref()
    }

    /// Get a reference to the MercadoPago backend.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentBackend {
        self.inner.payments.as_ref()
    }

    /// Get a reference to the processed-webhook ledger.
    #[must_use]
    pub fn webhook_ledger(&self) -> &dyn WebhookLedger {
        self.inner.webhook_ledger.as_ref()
    }

    /// Fetch a product for cart pricing, memoized for the summary TTL.
    ///
    /// Concurrent lookups of the same id share one backend call. Unknown
    /// products and failures are not cached.
    ///
    /// # Errors
    ///
    /// Returns [`ProductLookupError::NotFound`] for unknown products, or the
    /// backend error.
    pub async fn cached_product(&self, id: ProductId) -> Result<Product, ProductLookupError> {
        self.inner
            .product_cache
            .try_get_with(id, async {
                self.commerce()
                    .product_by_id(id)
                    .await?
                    .ok_or(ProductLookupError::NotFound)
            })
            .await
            .map_err(|e| ProductLookupError::clone(&e))
    }
}
