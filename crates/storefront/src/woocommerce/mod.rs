//! WooCommerce REST API client.
//!
//! # Architecture
//!
//! - WooCommerce is the system of record for products, categories and orders -
//!   NO local persistence, direct API calls
//! - GET responses are cached in memory through an injected [`ResponseCache`]
//!   (see [`crate::cache`]); order reads and all writes bypass the cache
//! - HTTP Basic auth with the consumer key/secret pair
//!
//! Handlers depend on the [`CommerceBackend`] trait, not on the concrete
//! client, so tests can substitute an in-memory backend.
//!
//! [`ResponseCache`]: crate::cache::ResponseCache

mod client;
pub mod types;

pub use client::WooCommerceClient;
pub use types::*;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tienda_core::{OrderId, ProductId};

/// Errors that can occur when talking to WooCommerce.
///
/// Cloneable so that callers waiting on the same cached read all receive the
/// failure.
#[derive(Debug, Clone, Error)]
pub enum CommerceError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[source] Arc<reqwest::Error>),

    /// Backend answered with a non-success status.
    #[error("WooCommerce fetch failed {status}: {url}")]
    Status { status: u16, url: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[source] Arc<serde_json::Error>),

    /// A required setting is absent. Retrying will not help.
    #[error("WooCommerce is not configured: {0} missing")]
    MissingConfig(&'static str),

    /// A proxied path tried to leave the REST namespace.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl From<reqwest::Error> for CommerceError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(Arc::new(e))
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(Arc::new(e))
    }
}

impl CommerceError {
    /// Upstream HTTP status, when the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend reported the resource as absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Operations the storefront needs from the commerce backend.
#[async_trait]
pub trait CommerceBackend: Send + Sync {
    /// List products, optionally filtered by category and featured flag.
    async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, CommerceError>;

    /// Fetch a product by id. `Ok(None)` when the backend reports 404.
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, CommerceError>;

    /// Fetch a product by slug.
    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, CommerceError>;

    /// List product categories (first 100).
    async fn categories(&self) -> Result<Vec<Category>, CommerceError>;

    /// Find a category by slug.
    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, CommerceError> {
        Ok(self
            .categories()
            .await?
            .into_iter()
            .find(|c| c.slug == slug))
    }

    /// Create an order. Never cached.
    async fn create_order(&self, order: &NewOrder) -> Result<Order, CommerceError>;

    /// Apply a partial update to an order. Never cached.
    async fn update_order(&self, id: OrderId, update: &OrderUpdate)
    -> Result<Order, CommerceError>;

    /// Fetch an order. Never cached, so status polling sees updates.
    async fn order(&self, id: OrderId) -> Result<Order, CommerceError>;

    /// GET an arbitrary path below `/wc/v3/`, returning the raw JSON.
    async fn get_raw(
        &self,
        path: &str,
        query: Option<&str>,
    ) -> Result<serde_json::Value, CommerceError>;
}
