//! WooCommerce REST v3 resource types.
//!
//! Only the fields the storefront reads or writes are modelled; unknown fields
//! in responses are ignored.

use serde::{Deserialize, Serialize};
use tienda_core::{CategoryId, OrderId, OrderStatus, ProductId, VariationId};

/// Fields requested when listing products.
pub const PRODUCT_LIST_FIELDS: &str =
    "id,name,slug,price,regular_price,sale_price,images,categories,short_description";

/// Fields requested when listing categories.
pub const CATEGORY_LIST_FIELDS: &str = "id,name,slug,image";

// =============================================================================
// Catalog
// =============================================================================

/// A product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    /// Current price as a decimal string; empty when the product has no price.
    #[serde(default)]
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
}

impl Product {
    /// URL of the first product image.
    #[must_use]
    pub fn first_image(&self) -> Option<&str> {
        self.images.first().map(|img| img.src.as_str())
    }

    /// The price to charge: `price`, falling back to `regular_price`.
    #[must_use]
    pub fn unit_price(&self) -> rust_decimal::Decimal {
        let raw = if self.price.trim().is_empty() {
            self.regular_price.as_deref().unwrap_or_default()
        } else {
            &self.price
        };
        tienda_core::parse_amount(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Category reference embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image: Option<Image>,
}

/// Filters for listing products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductQuery {
    pub per_page: Option<u32>,
    /// Category id or slug.
    pub category: Option<String>,
    pub featured: Option<bool>,
}

// =============================================================================
// Orders
// =============================================================================

/// Postal and contact details; used for both billing and shipping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<VariationId>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingLine {
    pub method_id: String,
    pub method_title: String,
    pub total: String,
}

/// An order meta entry. Values are arbitrary JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub key: String,
    pub value: serde_json::Value,
}

impl MetaData {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            id: None,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An order as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub shipping_lines: Vec<ShippingLine>,
    #[serde(default)]
    pub billing: Option<Address>,
    #[serde(default)]
    pub shipping: Option<Address>,
    #[serde(default)]
    pub meta_data: Vec<MetaData>,
}

impl Order {
    /// Value of the first meta entry with the given key.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&serde_json::Value> {
        self.meta_data.iter().find(|m| m.key == key).map(|m| &m.value)
    }
}

/// Body of an order creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrder {
    pub status: OrderStatus,
    pub line_items: Vec<LineItem>,
    pub shipping_lines: Vec<ShippingLine>,
    pub billing: Address,
    pub shipping: Address,
    pub meta_data: Vec<MetaData>,
}

/// Partial order update.
///
/// The backend replaces top-level fields that are present and merges
/// `meta_data` entries by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub meta_data: Vec<MetaData>,
}

impl OrderUpdate {
    /// An update that only adds meta entries.
    #[must_use]
    pub const fn meta(meta_data: Vec<MetaData>) -> Self {
        Self {
            status: None,
            meta_data,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_parses_sparse_response() {
        let product: Product = serde_json::from_value(json!({
            "id": 42,
            "name": "Yerba 1kg",
            "slug": "yerba-1kg",
            "price": "",
            "regular_price": "1000",
            "images": [{"src": "https://cdn.example.uy/yerba.jpg", "alt": ""}],
            "stock_status": "instock"
        }))
        .unwrap();
        assert_eq!(product.unit_price(), Decimal::from(1000));
        assert_eq!(product.first_image(), Some("https://cdn.example.uy/yerba.jpg"));
    }

    #[test]
    fn test_unit_price_without_any_price_is_zero() {
        let product: Product =
            serde_json::from_value(json!({"id": 1, "name": "x", "slug": "x"})).unwrap();
        assert_eq!(product.unit_price(), Decimal::ZERO);
        assert_eq!(product.first_image(), None);
    }

    #[test]
    fn test_order_update_skips_absent_fields() {
        let update = OrderUpdate::meta(vec![MetaData::new("mp_preference_id", "pref-1")]);
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"meta_data": [{"key": "mp_preference_id", "value": "pref-1"}]})
        );
    }

    #[test]
    fn test_order_meta_lookup() {
        let order: Order = serde_json::from_value(json!({
            "id": 77,
            "status": "pending",
            "meta_data": [{"id": 9, "key": "mp_preference_id", "value": "pref-1"}]
        }))
        .unwrap();
        assert_eq!(order.meta("mp_preference_id"), Some(&json!("pref-1")));
        assert_eq!(order.meta("missing"), None);
    }
}
