//! Browser-side cart and favorites.
//!
//! Both lists live in the shopper's local storage as JSON arrays and are never
//! shared across sessions. The storefront service only ever sees the
//! [`CheckoutLine`]s a cart produces at checkout time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    /// Unit price, never negative.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Always at least 1.
    #[serde(alias = "qty")]
    pub quantity: u32,
}

/// A line of an order request, as posted to the checkout endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Restore a cart from its stored JSON form.
    ///
    /// Anything unreadable yields an empty cart; a corrupt storage entry must
    /// never block the shopper.
    #[must_use]
    pub fn from_storage(raw: &str) -> Self {
        let mut cart: Self = serde_json::from_str(raw).unwrap_or_default();
        cart.items.retain(|item| item.price >= Decimal::ZERO);
        for item in &mut cart.items {
            item.quantity = item.quantity.max(1);
        }
        cart
    }

    /// Serialize for local storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_storage(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` units of a product, merging with an existing line.
    pub fn add(&mut self, mut item: CartItem, quantity: u32) {
        let quantity = quantity.max(1);
        if let Some(existing) = self.items.iter_mut().find(|p| p.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            item.quantity = quantity;
            item.price = item.price.max(Decimal::ZERO);
            self.items.push(item);
        }
    }

    pub fn increase(&mut self, id: ProductId) {
        if let Some(item) = self.items.iter_mut().find(|p| p.id == id) {
            item.quantity = item.quantity.saturating_add(1);
        }
    }

    /// Decrease by one; a line never drops below 1 (use [`Cart::remove`]).
    pub fn decrease(&mut self, id: ProductId) {
        if let Some(item) = self.items.iter_mut().find(|p| p.id == id) {
            item.quantity = item.quantity.saturating_sub(1).max(1);
        }
    }

    pub fn remove(&mut self, id: ProductId) {
        self.items.retain(|p| p.id != id);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total number of units.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|it| u64::from(it.quantity)).sum()
    }

    /// Sum of price × quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(|it| it.price * Decimal::from(it.quantity))
            .sum()
    }

    /// The lines to post when checking out.
    #[must_use]
    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        self.items
            .iter()
            .map(|it| CheckoutLine {
                product_id: it.id,
                quantity: it.quantity,
            })
            .collect()
    }
}

/// Products the shopper marked as favorites.
///
/// Entries are kept as opaque JSON objects; only `id` is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites {
    items: Vec<serde_json::Value>,
}

impl Favorites {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn items(&self) -> &[serde_json::Value] {
        &self.items
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.items.iter().any(|p| entry_id(p) == Some(id))
    }

    pub fn add(&mut self, product: serde_json::Value) {
        self.items.push(product);
    }

    pub fn remove(&mut self, id: ProductId) {
        self.items.retain(|p| entry_id(p) != Some(id));
    }

    /// Add the product if absent, remove it if present.
    ///
    /// Returns `true` if the product is a favorite afterwards.
    pub fn toggle(&mut self, product: serde_json::Value) -> bool {
        match entry_id(&product) {
            Some(id) if self.contains(id) => {
                self.remove(id);
                false
            }
            _ => {
                self.add(product);
                true
            }
        }
    }
}

fn entry_id(product: &serde_json::Value) -> Option<ProductId> {
    product
        .get("id")
        .and_then(|id| serde_json::from_value(id.clone()).ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item(id: u64, price: i64) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Producto {id}"),
            slug: format!("producto-{id}"),
            price: Decimal::from(price),
            image: None,
            quantity: 1,
        }
    }

    #[test]
    fn test_add_merges_same_product() {
        let mut cart = Cart::new();
        cart.add(item(1, 100), 1);
        cart.add(item(1, 100), 2);
        cart.add(item(2, 50), 1);
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.total_items(), 4);
        assert_eq!(cart.subtotal(), Decimal::from(350));
    }

    #[test]
    fn test_decrease_floors_at_one() {
        let mut cart = Cart::new();
        cart.add(item(1, 100), 2);
        cart.decrease(ProductId::new(1));
        cart.decrease(ProductId::new(1));
        assert_eq!(cart.items()[0].quantity, 1);
        cart.increase(ProductId::new(1));
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(item(1, 100), 1);
        cart.add(item(2, 100), 1);
        cart.remove(ProductId::new(1));
        assert_eq!(cart.items().len(), 1);
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_storage_roundtrip_accepts_legacy_qty() {
        let raw = r#"[{"id":"42","name":"Yerba","slug":"yerba","price":1000,"qty":2}]"#;
        let cart = Cart::from_storage(raw);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.checkout_lines()[0].product_id, ProductId::new(42));

        let stored = cart.to_storage().unwrap();
        assert_eq!(Cart::from_storage(&stored), cart);
    }

    #[test]
    fn test_corrupt_storage_is_empty_cart() {
        assert!(Cart::from_storage("{not json").is_empty());
        assert!(Cart::from_storage("{\"id\":1}").is_empty());
    }

    #[test]
    fn test_favorites_toggle() {
        let mut favorites = Favorites::new();
        assert!(favorites.toggle(json!({"id": 7, "name": "Mate"})));
        assert!(favorites.contains(ProductId::new(7)));
        assert!(!favorites.toggle(json!({"id": "7"})));
        assert!(!favorites.contains(ProductId::new(7)));
        assert!(favorites.items().is_empty());
    }
}
