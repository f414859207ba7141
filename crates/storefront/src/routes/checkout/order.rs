//! `POST /api/checkout/order`.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tienda_core::{LenientNumber, OrderStatus, ProductId, VariationId, normalize_quantity};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::ValidJson;
use crate::state::AppState;
use crate::woocommerce::{Address, LineItem, MetaData, NewOrder, ShippingLine};

/// Country assumed when the customer does not supply one.
pub const DEFAULT_COUNTRY: &str = "UY";

/// Checkout submission from the frontend.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default, rename = "shippingLine", alias = "shipping_line")]
    pub shipping_line: Option<ShippingLineInput>,
    #[serde(default)]
    pub meta: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub variation_id: Option<LenientNumber>,
    #[serde(default, alias = "qty")]
    pub quantity: Option<LenientNumber>,
}

/// Contact details plus optional explicit addresses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub billing: Option<Address>,
    #[serde(default)]
    pub shipping: Option<Address>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingLineInput {
    pub method_id: String,
    #[serde(default)]
    pub method_title: Option<String>,
    #[serde(default)]
    pub total: Option<LenientNumber>,
}

impl OrderRequest {
    /// Build the backend order, or reject the request.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` when there are no items or no customer.
    pub fn into_new_order(self) -> Result<NewOrder> {
        if self.items.is_empty() {
            return Err(AppError::invalid_payload());
        }
        let customer = self.customer.ok_or_else(AppError::invalid_payload)?;

        let line_items = self.items.iter().map(OrderItem::to_line_item).collect();
        let shipping_lines = self
            .shipping_line
            .map(ShippingLineInput::into_shipping_line)
            .into_iter()
            .collect();
        let meta_data = self
            .meta
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| MetaData::new(key, value))
            .collect();

        Ok(NewOrder {
            status: OrderStatus::Pending,
            line_items,
            shipping_lines,
            billing: customer.billing_address(),
            shipping: customer.shipping_address(),
            meta_data,
        })
    }
}

impl OrderItem {
    fn to_line_item(&self) -> LineItem {
        LineItem {
            product_id: self.product_id,
            variation_id: self
                .variation_id
                .as_ref()
                .and_then(LenientNumber::as_id)
                .filter(|id| *id > 0)
                .map(VariationId::new),
            quantity: normalize_quantity(self.quantity.as_ref()),
            name: None,
            total: None,
        }
    }
}

impl ShippingLineInput {
    fn into_shipping_line(self) -> ShippingLine {
        let method_title = self
            .method_title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| self.method_id.clone());
        ShippingLine {
            method_id: self.method_id,
            method_title,
            total: self
                .total
                .map_or_else(|| "0".to_string(), |total| total.to_string()),
        }
    }
}

impl Customer {
    /// Explicit billing address as supplied, or one assembled from the
    /// contact fields and the shipping address.
    fn billing_address(&self) -> Address {
        self.billing.clone().unwrap_or_else(|| {
            let shipping = self.shipping.clone().unwrap_or_default();
            with_default_country(Address {
                first_name: self.first_name.clone(),
                last_name: self.last_name.clone(),
                email: self.email.clone(),
                phone: self.phone.clone(),
                ..shipping
            })
        })
    }

    /// Explicit shipping address as supplied, or an empty one in the
    /// default country.
    fn shipping_address(&self) -> Address {
        self.shipping
            .clone()
            .unwrap_or_else(|| with_default_country(Address::default()))
    }
}

fn with_default_country(mut address: Address) -> Address {
    if address.country.as_deref().is_none_or(|c| c.trim().is_empty()) {
        address.country = Some(DEFAULT_COUNTRY.to_string());
    }
    address
}

/// Create a pending order from the submitted cart.
pub async fn create(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<OrderRequest>,
) -> Result<Json<Value>> {
    let order = request.into_new_order()?;

    add_breadcrumb(
        "checkout",
        "Creating order",
        &[("lines", &order.line_items.len().to_string())],
    );

    let created = state.commerce().create_order(&order).await?;
    tracing::info!(order_id = %created.id, status = %created.status, "Order created");

    Ok(Json(json!({
        "ok": true,
        "order_id": created.id,
        "status": created.status,
    })))
}
