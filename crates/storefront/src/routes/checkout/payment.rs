//! `POST /api/checkout/payment`.
//!
//! Creates a MercadoPago preference for an existing order and records the
//! preference id on the order. If the preference cannot be created the order
//! stays `pending`; the frontend offers a retry that calls this endpoint again
//! with the same order id.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};
use tienda_core::{LenientNumber, OrderId};
use url::form_urlencoded;

use crate::config::StorefrontConfig;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::ValidJson;
use crate::mercadopago::{BackUrls, PreferenceItem, PreferencePayer, PreferenceRequest};
use crate::state::AppState;
use crate::woocommerce::{MetaData, OrderUpdate};

/// Path MercadoPago posts notifications to.
pub const WEBHOOK_PATH: &str = "/api/webhooks/mercadopago";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentRequest {
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub totals: Option<PaymentTotals>,
    #[serde(default)]
    pub payer: Option<PreferencePayer>,
}

/// Totals as computed by the client. Only the grand total is used.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentTotals {
    #[serde(default, rename = "grandTotal", alias = "grand_total")]
    pub grand_total: Option<LenientNumber>,
}

impl PaymentRequest {
    /// The order id and a positive amount to charge.
    ///
    /// The amount is the client's figure; it is not recomputed from the
    /// order's line items.
    fn validated(&self) -> Result<(OrderId, Decimal)> {
        let order_id = self
            .order_id
            .filter(|id| id.as_u64() > 0)
            .ok_or_else(AppError::invalid_payload)?;
        let amount = self
            .totals
            .as_ref()
            .and_then(|t| t.grand_total.as_ref())
            .and_then(LenientNumber::as_decimal)
            .filter(|amount| *amount > Decimal::ZERO)
            .ok_or_else(AppError::invalid_payload)?;
        Ok((order_id, amount))
    }
}

/// Append `order_id` to a redirect URL.
fn with_order_id(url: &str, order_id: OrderId) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}order_id={order_id}")
}

/// Webhook URL, carrying the shared secret as `token` when one is configured.
fn notification_url(config: &StorefrontConfig) -> String {
    let base = config.site_url(WEBHOOK_PATH);
    match &config.mercadopago.webhook_secret {
        Some(secret) => {
            let token: String =
                form_urlencoded::byte_serialize(secret.expose_secret().as_bytes()).collect();
            format!("{base}?token={token}")
        }
        None => base,
    }
}

/// Build the preference for an order.
#[must_use]
pub fn preference_request(
    config: &StorefrontConfig,
    order_id: OrderId,
    amount: Decimal,
    payer: PreferencePayer,
) -> PreferenceRequest {
    let mp = &config.mercadopago;
    let back_url = |path: &str| with_order_id(&config.site_url(path), order_id);

    PreferenceRequest {
        external_reference: order_id.to_string(),
        items: vec![PreferenceItem {
            title: format!("Pedido #{order_id}"),
            quantity: 1,
            currency_id: mp.currency,
            unit_price: amount,
        }],
        payer,
        back_urls: BackUrls {
            success: back_url(&mp.success_path),
            failure: back_url(&mp.failure_path),
            pending: back_url(&mp.pending_path),
        },
        auto_return: "approved".to_string(),
        notification_url: notification_url(config),
    }
}

/// Start payment for an order and return the MercadoPago redirect.
pub async fn create(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<PaymentRequest>,
) -> Result<Json<Value>> {
    let (order_id, amount) = request.validated()?;
    let order_ref = order_id.to_string();
    add_breadcrumb("checkout", "Creating payment preference", &[("order_id", &order_ref)]);

    let preference = preference_request(
        state.config(),
        order_id,
        amount,
        request.payer.unwrap_or_default(),
    );

    let created = state
        .payments()
        .create_preference(&preference)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                order_id = %order_id,
                error = %e,
                "Preference creation failed, order left pending"
            );
        })?;

    state
        .commerce()
        .update_order(
            order_id,
            &OrderUpdate::meta(vec![MetaData::new(
                "mp_preference_id",
                created.id.as_str(),
            )]),
        )
        .await?;

    tracing::info!(order_id = %order_id, preference_id = %created.id, "Payment preference created");

    Ok(Json(json!({
        "ok": true,
        "init_point": created.init_point,
        "preference_id": created.id,
    })))
}
