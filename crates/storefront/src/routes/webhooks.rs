//! `POST /api/webhooks/mercadopago`.
//!
//! MercadoPago keeps retrying a notification until it receives a 2xx, so every
//! outcome except a failed secret check is acknowledged with 200. Failures are
//! logged and sent to Sentry; the next delivery of the same notification
//! retries them, since only successfully applied notifications are recorded
//! in the ledger.
//!
//! All inputs come from the query string; the body is ignored.

use axum::{
    Json,
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use serde_json::json;
use tienda_core::OrderId;
use url::form_urlencoded;

use crate::error::AppError;
use crate::mercadopago::PaymentOutcome;
use crate::services::WebhookKey;
use crate::state::AppState;
use crate::woocommerce::{MetaData, OrderUpdate};

/// Query parameters of a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    pub token: Option<String>,
    /// `type`, or the legacy `topic`.
    pub kind: Option<String>,
    /// `id`, or `data.id`.
    pub id: Option<String>,
}

impl Notification {
    /// Parse a raw query string. The first occurrence of a key wins.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut token = None;
        let mut kind = None;
        let mut topic = None;
        let mut id = None;
        let mut data_id = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "token" => &mut token,
                "type" => &mut kind,
                "topic" => &mut topic,
                "id" => &mut id,
                "data.id" => &mut data_id,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            token,
            kind: non_empty(kind).or_else(|| non_empty(topic)),
            id: non_empty(id).or_else(|| non_empty(data_id)),
        }
    }

    /// The idempotency key, when both parts are present.
    #[must_use]
    pub fn key(&self) -> Option<WebhookKey> {
        Some(WebhookKey::new(self.kind.clone()?, self.id.clone()?))
    }
}

/// How a notification was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handled {
    Applied,
    /// No usable order reference on the payment.
    Ignored,
}

/// Compare secrets without short-circuiting on the first differing byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes().zip(b.bytes()).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Ask MercadoPago what the notification refers to.
async fn resolve(state: &AppState, key: &WebhookKey) -> Result<PaymentOutcome, AppError> {
    let outcome = if key.kind.contains("merchant_order") {
        state.payments().merchant_order(&key.id).await?.into()
    } else {
        // `payment`, and anything unrecognized
        state.payments().payment(&key.id).await?.into()
    };
    Ok(outcome)
}

fn order_update(outcome: &PaymentOutcome, key: &WebhookKey) -> OrderUpdate {
    let mut meta_data = vec![
        MetaData::new("mp_webhook_status", outcome.status.clone()),
        MetaData::new("mp_webhook_id", key.id.as_str()),
        MetaData::new("mp_webhook_type", key.kind.as_str()),
    ];
    if let Some(payment_id) = &outcome.payment_id {
        meta_data.push(MetaData::new("mp_payment_id", payment_id.as_str()));
    }
    if let Some(email) = outcome.payer_email.as_deref().filter(|e| !e.is_empty()) {
        meta_data.push(MetaData::new("mp_payer_email", email));
    }

    OrderUpdate {
        status: Some(outcome.payment_status().order_status()),
        meta_data,
    }
}

async fn apply(state: &AppState, key: &WebhookKey) -> Result<Handled, AppError> {
    let outcome = resolve(state, key).await?;

    let Some(order_id) = outcome
        .external_reference
        .as_deref()
        .and_then(|r| r.parse::<OrderId>().ok())
        .filter(|id| id.as_u64() > 0)
    else {
        tracing::info!(
            key = %key,
            external_reference = ?outcome.external_reference,
            "Notification has no order reference"
        );
        return Ok(Handled::Ignored);
    };

    let update = order_update(&outcome, key);
    state.commerce().update_order(order_id, &update).await?;
    state.webhook_ledger().mark_processed(key.clone()).await;

    tracing::info!(
        key = %key,
        order_id = %order_id,
        payment_status = ?outcome.status,
        "Order updated from notification"
    );
    Ok(Handled::Applied)
}

/// Handle a MercadoPago notification.
pub async fn mercadopago(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let notification = Notification::from_query(query.as_deref().unwrap_or_default());

    if let Some(secret) = &state.config().mercadopago.webhook_secret {
        let token = notification.token.as_deref().unwrap_or_default();
        if !constant_time_eq(token, secret.expose_secret()) {
            tracing::warn!("Notification rejected: bad token");
            return AppError::Unauthorized.into_response();
        }
    }

    let Some(key) = notification.key() else {
        tracing::debug!(
            kind = ?notification.kind,
            id = ?notification.id,
            "Notification without type or id"
        );
        return Json(json!({ "ok": true })).into_response();
    };

    if state.webhook_ledger().contains(&key).await {
        tracing::debug!(key = %key, "Duplicate notification");
        return Json(json!({ "ok": true, "duplicate": true })).into_response();
    }

    let body = match apply(&state, &key).await {
        Ok(Handled::Applied) => Json(json!({ "ok": true })),
        Ok(Handled::Ignored) => Json(json!({ "ok": true, "ignored": true })),
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(
                key = %key,
                error = %e,
                sentry_event_id = %event_id,
                "Notification processing failed"
            );
            Json(json!({ "ok": true }))
        }
    };
    body.into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tienda_core::OrderStatus;

    use super::*;
    use crate::mercadopago::ProviderId;

    #[test]
    fn test_parse_aliases() {
        let n = Notification::from_query("topic=merchant_order&data.id=99&token=abc");
        assert_eq!(n.kind.as_deref(), Some("merchant_order"));
        assert_eq!(n.id.as_deref(), Some("99"));
        assert_eq!(n.token.as_deref(), Some("abc"));
        assert_eq!(n.key(), Some(WebhookKey::new("merchant_order", "99")));
    }

    #[test]
    fn test_type_takes_precedence_over_topic() {
        let n = Notification::from_query("type=payment&topic=merchant_order&id=1&id=2");
        assert_eq!(n.kind.as_deref(), Some("payment"));
        assert_eq!(n.id.as_deref(), Some("1"));
    }

    #[test]
    fn test_missing_parts_have_no_key() {
        assert_eq!(Notification::from_query("type=payment").key(), None);
        assert_eq!(Notification::from_query("id=5&type=").key(), None);
        assert_eq!(Notification::from_query("").key(), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("s3cr3t", "s3cr3t"));
        assert!(!constant_time_eq("s3cr3t", "s3cr3T"));
        assert!(!constant_time_eq("s3cr3t", "s3cr3t!"));
        assert!(!constant_time_eq("", "s3cr3t"));
    }

    #[test]
    fn test_order_update_metadata() {
        let outcome = PaymentOutcome {
            external_reference: Some("77".to_string()),
            status: Some("approved".to_string()),
            payment_id: Some(ProviderId::new("555")),
            payer_email: Some("ana@example.uy".to_string()),
        };
        let update = order_update(&outcome, &WebhookKey::new("payment", "555"));

        assert_eq!(update.status, Some(OrderStatus::Processing));
        let keys: Vec<&str> = update.meta_data.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(
            keys,
            [
                "mp_webhook_status",
                "mp_webhook_id",
                "mp_webhook_type",
                "mp_payment_id",
                "mp_payer_email"
            ]
        );
    }

    #[test]
    fn test_missing_status_is_recorded_as_null() {
        let update = order_update(&PaymentOutcome::default(), &WebhookKey::new("payment", "1"));
        assert_eq!(update.status, Some(OrderStatus::OnHold));
        assert_eq!(update.meta_data[0].value, serde_json::Value::Null);
        assert_eq!(update.meta_data.len(), 3);
    }
}
