//! `reqwest` implementation of [`CommerceBackend`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tienda_core::{OrderId, ProductId};
use tracing::{debug, instrument};
use url::form_urlencoded;

use super::types::{
    CATEGORY_LIST_FIELDS, Category, NewOrder, Order, OrderUpdate, PRODUCT_LIST_FIELDS, Product,
    ProductQuery,
};
use super::{CommerceBackend, CommerceError};
use crate::cache::ResponseCache;
use crate::config::WooCommerceConfig;

/// Characters of an upstream error body kept in logs.
const LOGGED_BODY_CHARS: usize = 500;

/// Client for the WooCommerce REST API (`/wp-json/wc/v3`).
#[derive(Clone)]
pub struct WooCommerceClient {
    inner: Arc<WooCommerceClientInner>,
}

struct WooCommerceClientInner {
    http: reqwest::Client,
    base_url: Option<String>,
    consumer_key: Option<SecretString>,
    consumer_secret: Option<SecretString>,
    cache: Arc<dyn ResponseCache>,
}

impl WooCommerceClient {
    /// Create a new WooCommerce client reading through `cache`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(
        config: &WooCommerceConfig,
        cache: Arc<dyn ResponseCache>,
    ) -> Result<Self, CommerceError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tienda-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(WooCommerceClientInner {
                http,
                base_url: config.base_url.clone(),
                consumer_key: config.consumer_key.clone(),
                consumer_secret: config.consumer_secret.clone(),
                cache,
            }),
        })
    }

    /// Absolute URL of a REST path such as `/products?per_page=5`.
    fn url(&self, path: &str) -> Result<String, CommerceError> {
        let base = self
            .inner
            .base_url
            .as_deref()
            .ok_or(CommerceError::MissingConfig("WP_JSON_URL"))?;
        Ok(format!("{base}/wc/v3{path}"))
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, CommerceError> {
        let key = self
            .inner
            .consumer_key
            .as_ref()
            .ok_or(CommerceError::MissingConfig("WC_CONSUMER_KEY"))?;
        let secret = self
            .inner
            .consumer_secret
            .as_ref()
            .ok_or(CommerceError::MissingConfig("WC_CONSUMER_SECRET"))?;
        Ok(request.basic_auth(key.expose_secret(), Some(secret.expose_secret())))
    }

    /// Send a request and parse the JSON body of a successful response.
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Value, CommerceError> {
        let response = self.authorized(request)?.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let body = body.chars().take(LOGGED_BODY_CHARS).collect::<String>();
            if status.is_server_error() {
                tracing::error!(status = %status, url = %url, body = %body, "WooCommerce returned server error");
            } else {
                tracing::warn!(status = %status, url = %url, body = %body, "WooCommerce rejected request");
            }
            return Err(CommerceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                url = %url,
                body = %body.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
                "Failed to parse WooCommerce response"
            );
            CommerceError::from(e)
        })
    }

    /// GET through the response cache. Concurrent misses for the same URL
    /// share one upstream request.
    async fn get_cached(&self, path: &str) -> Result<Arc<Value>, CommerceError> {
        let url = self.url(path)?;
        let key = format!("GET {url}");
        let request = self.inner.http.get(&url);

        self.inner
            .cache
            .get_or_load(
                key,
                Box::pin(async move {
                    debug!(url = %url, "Cache miss");
                    self.send(request, &url).await.map(Arc::new)
                }),
            )
            .await
    }

    async fn get_typed<T: DeserializeOwned>(&self, path: &str) -> Result<T, CommerceError> {
        let value = self.get_cached(path).await?;
        Ok(T::deserialize(value.as_ref())?)
    }
}

#[async_trait]
impl CommerceBackend for WooCommerceClient {
    #[instrument(skip(self))]
    async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, CommerceError> {
        self.get_typed(&format!("/products?{}", product_list_query(query)))
            .await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, CommerceError> {
        match self.get_typed(&format!("/products/{id}")).await {
            Ok(product) => Ok(Some(product)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, CommerceError> {
        let qs = form_urlencoded::Serializer::new(String::new())
            .append_pair("slug", slug)
            .finish();
        let products: Vec<Product> = self.get_typed(&format!("/products?{qs}")).await?;
        Ok(products.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<Category>, CommerceError> {
        self.get_typed(&format!(
            "/products/categories?per_page=100&_fields={CATEGORY_LIST_FIELDS}"
        ))
        .await
    }

    #[instrument(skip(self, order), fields(lines = order.line_items.len()))]
    async fn create_order(&self, order: &NewOrder) -> Result<Order, CommerceError> {
        let url = self.url("/orders")?;
        let value = self.send(self.inner.http.post(&url).json(order), &url).await?;
        Ok(serde_json::from_value(value)?)
    }

    #[instrument(skip(self, update), fields(order_id = %id))]
    async fn update_order(
        &self,
        id: OrderId,
        update: &OrderUpdate,
    ) -> Result<Order, CommerceError> {
        let url = self.url(&format!("/orders/{id}"))?;
        let value = self.send(self.inner.http.put(&url).json(update), &url).await?;
        Ok(serde_json::from_value(value)?)
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn order(&self, id: OrderId) -> Result<Order, CommerceError> {
        let url = self.url(&format!("/orders/{id}"))?;
        let value = self.send(self.inner.http.get(&url), &url).await?;
        Ok(serde_json::from_value(value)?)
    }

    #[instrument(skip(self))]
    async fn get_raw(&self, path: &str, query: Option<&str>) -> Result<Value, CommerceError> {
        let path = validate_proxy_path(path)?;
        let path = match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("/{path}?{q}"),
            None => format!("/{path}"),
        };
        let value = self.get_cached(&path).await?;
        Ok(value.as_ref().clone())
    }
}

/// Query string for a product listing.
fn product_list_query(query: &ProductQuery) -> String {
    let mut qs = form_urlencoded::Serializer::new(String::new());
    if let Some(per_page) = query.per_page.filter(|n| *n > 0) {
        qs.append_pair("per_page", &per_page.to_string());
    }
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        qs.append_pair("category", category);
    }
    if let Some(featured) = query.featured {
        qs.append_pair("featured", if featured { "true" } else { "false" });
    }
    qs.append_pair("_fields", PRODUCT_LIST_FIELDS);
    qs.finish()
}

/// Reject proxied paths that could escape `/wc/v3/` once the URL is normalized.
fn validate_proxy_path(path: &str) -> Result<&str, CommerceError> {
    let trimmed = path.trim_matches('/');
    let escapes = trimmed.is_empty()
        || trimmed.split('/').any(|segment| {
            segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains(['\\', '%', '?', '#'])
        });
    if escapes {
        return Err(CommerceError::InvalidPath(path.to_string()));
    }
    Ok(trimmed)
}
