//! `POST /api/checkout/validate-cart`.
//!
//! Totals a cart from the prices the client already holds. Unlike the
//! summary endpoint, nothing is looked up in the catalog.

use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tienda_core::{Destination, LenientNumber, normalize_quantity, quote};

use super::Totals;
use crate::error::Result;
use crate::extract::ValidJson;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateCartRequest {
    #[serde(default)]
    pub items: Vec<PricedItem>,
    #[serde(default)]
    pub destination: Option<Destination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricedItem {
    #[serde(default)]
    pub price: Option<LenientNumber>,
    #[serde(default, alias = "qty")]
    pub quantity: Option<LenientNumber>,
}

impl PricedItem {
    /// Price times quantity; a missing or unreadable price counts as zero.
    fn line_total(&self) -> Decimal {
        let price = self
            .price
            .as_ref()
            .and_then(LenientNumber::as_decimal)
            .unwrap_or_default();
        price * Decimal::from(normalize_quantity(self.quantity.as_ref()))
    }
}

pub async fn validate(ValidJson(request): ValidJson<ValidateCartRequest>) -> Result<Json<Value>> {
    let subtotal: Decimal = request.items.iter().map(PricedItem::line_total).sum();
    let shipping = quote(subtotal, request.destination.as_ref());

    Ok(Json(json!({
        "ok": true,
        "totals": Totals::new(subtotal, &shipping),
        "shipping": shipping,
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_defaults_to_one() {
        let items: Vec<PricedItem> = serde_json::from_value(json!([
            {"id": 1, "price": "450", "quantity": 2},
            {"id": 2, "price": 300},
            {"id": 3, "price": "n/a", "quantity": 5}
        ]))
        .unwrap();

        let subtotal: Decimal = items.iter().map(PricedItem::line_total).sum();
        assert_eq!(subtotal, Decimal::from(1200));
    }

    #[tokio::test]
    async fn test_free_shipping_at_threshold() {
        let request: ValidateCartRequest = serde_json::from_value(json!({
            "items": [{"price": 1000, "quantity": 2}],
            "destination": {"city": "Montevideo"}
        }))
        .unwrap();

        let Json(body) = validate(ValidJson(request)).await.unwrap();
        assert_eq!(body["totals"]["grandTotal"], json!(2000.0));
        assert_eq!(body["shipping"]["method_id"], "flat_rate_free");
    }
}
