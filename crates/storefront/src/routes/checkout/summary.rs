//! `POST /api/checkout/summary`.
//!
//! Prices a cart against live catalog data. Products are looked up
//! concurrently through the state's product cache; ids that do not resolve
//! are left out of the summary rather than failing it.

use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::value::RawValue;
use tienda_core::{LenientNumber, ProductId, ShippingQuote, normalize_quantity, quote};

use super::Totals;
use crate::error::{AppError, Result};
use crate::extract::ValidJson;
use crate::state::{AppState, ProductLookupError};
use crate::woocommerce::Product;

/// Browser caching allowed for a summary.
pub const SUMMARY_CACHE_CONTROL: &str = "private, max-age=30";

/// Characters of the encoded items kept as `cart_hash`.
const CART_HASH_LEN: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryRequest {
    /// Items exactly as sent; parsed by [`SummaryRequest::parsed_items`] and
    /// fingerprinted for `cart_hash`.
    #[serde(default)]
    pub items: Option<Box<RawValue>>,
}

impl SummaryRequest {
    fn parsed_items(&self) -> Result<Vec<SummaryItem>> {
        let Some(raw) = &self.items else {
            return Ok(Vec::new());
        };
        serde_json::from_str(raw.get()).map_err(|e| {
            tracing::debug!(error = %e, "Rejected summary items");
            AppError::invalid_payload()
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryItem {
    pub product_id: ProductId,
    #[serde(default, alias = "qty")]
    pub quantity: Option<LenientNumber>,
}

/// A priced cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(rename = "lineTotal", with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
}

impl SummaryLine {
    fn new(product: &Product, quantity: u32) -> Self {
        let price = product.unit_price();
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            image: product.first_image().map(String::from),
            price,
            quantity,
            line_total: price * Decimal::from(quantity),
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryMeta {
    timestamp: i64,
    cart_hash: String,
}

/// Short fingerprint of the items as the client sent them, for client-side
/// change detection.
fn cart_hash(items: &RawValue) -> String {
    STANDARD
        .encode(items.get())
        .chars()
        .take(CART_HASH_LEN)
        .collect()
}

/// Price each requested item, dropping products that cannot be found.
async fn price_items(state: &AppState, items: &[SummaryItem]) -> Vec<SummaryLine> {
    let lookups = items.iter().map(|item| async move {
        match state.cached_product(item.product_id).await {
            Ok(product) => Some(SummaryLine::new(
                &product,
                normalize_quantity(item.quantity.as_ref()),
            )),
            Err(ProductLookupError::NotFound) => {
                tracing::debug!(product_id = %item.product_id, "Unknown product in cart");
                None
            }
            Err(e) => {
                tracing::warn!(product_id = %item.product_id, error = %e, "Product lookup failed");
                None
            }
        }
    });

    join_all(lookups).await.into_iter().flatten().collect()
}

/// Summarize a cart: priced lines, totals and the shipping quote.
pub async fn summarize(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<SummaryRequest>,
) -> Result<Response> {
    let items = request.parsed_items()?;
    if items.is_empty() {
        return Ok(Json(json!({
            "ok": true,
            "items": [],
            "totals": Totals::zero(),
            "shipping": ShippingQuote::free_shipping(),
        }))
        .into_response());
    }

    let lines = price_items(&state, &items).await;
    let subtotal: Decimal = lines.iter().map(|line| line.line_total).sum();
    let shipping = quote(subtotal, None);
    let totals = Totals::new(subtotal, &shipping);

    let meta = SummaryMeta {
        timestamp: chrono::Utc::now().timestamp_millis(),
        cart_hash: request.items.as_deref().map(cart_hash).unwrap_or_default(),
    };

    Ok((
        [(header::CACHE_CONTROL, SUMMARY_CACHE_CONTROL)],
        Json(json!({
            "ok": true,
            "items": lines,
            "totals": totals,
            "shipping": shipping,
            "meta": meta,
        })),
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn request(body: &str) -> SummaryRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_cart_hash_is_prefix_of_encoded_items() {
        let request = request(r#"{"items":[{"product_id":42,"quantity":2}]}"#);
        // base64 of `[{"product_id":42,"quantity":2}]`
        assert_eq!(cart_hash(request.items.as_deref().unwrap()), "W3sicHJvZH");
    }

    #[test]
    fn test_cart_hash_follows_client_key_order() {
        let request = request(r#"{"items":[{"quantity":2,"product_id":42}]}"#);
        assert_eq!(cart_hash(request.items.as_deref().unwrap()), "W3sicXVhbn");
    }

    #[test]
    fn test_parsed_items() {
        let items = request(r#"{"items":[{"product_id":"42","qty":"3"}]}"#)
            .parsed_items()
            .unwrap();
        assert_eq!(items[0].product_id, ProductId::new(42));
        assert_eq!(normalize_quantity(items[0].quantity.as_ref()), 3);

        assert!(request("{}").parsed_items().unwrap().is_empty());
        assert!(request(r#"{"items":null}"#).parsed_items().unwrap().is_empty());
        assert!(request(r#"{"items":{"product_id":1}}"#).parsed_items().is_err());
    }

    #[test]
    fn test_line_uses_regular_price_fallback() {
        let product: Product = serde_json::from_value(json!({
            "id": 42, "name": "Yerba", "slug": "yerba", "price": "", "regular_price": "1000",
            "images": [{"src": "https://cdn.example.uy/y.jpg"}]
        }))
        .unwrap();

        let line = SummaryLine::new(&product, 2);
        assert_eq!(line.line_total, Decimal::from(2000));

        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["lineTotal"], Value::from(2000.0));
        assert_eq!(value["image"], "https://cdn.example.uy/y.jpg");
    }
}
