//! MercadoPago Checkout Pro resource types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tienda_core::{CurrencyCode, PaymentStatus};

/// Identifier issued by MercadoPago.
///
/// Payment ids arrive as JSON numbers, preference ids as strings; both are
/// kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProviderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

// =============================================================================
// Preferences
// =============================================================================

/// Body of `POST /checkout/preferences`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceRequest {
    /// The commerce order id; echoed back on payments and merchant orders.
    pub external_reference: String,
    pub items: Vec<PreferenceItem>,
    pub payer: PreferencePayer,
    pub back_urls: BackUrls,
    pub auto_return: String,
    pub notification_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: u32,
    pub currency_id: CurrencyCode,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencePayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
}

/// Where the payer's browser lands after checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

/// A created preference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Preference {
    pub id: ProviderId,
    pub init_point: String,
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
}

// =============================================================================
// Payments and merchant orders
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Payer {
    #[serde(default)]
    pub email: Option<String>,
}

/// `GET /v1/payments/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Payment {
    pub id: ProviderId,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub payer: Option<Payer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MerchantOrderPayment {
    pub id: ProviderId,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
}

/// `GET /merchant_orders/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MerchantOrder {
    pub id: ProviderId,
    #[serde(default)]
    pub external_reference: Option<String>,
    /// Aggregate status such as `paid` or `opened`.
    #[serde(default)]
    pub order_status: Option<String>,
    #[serde(default)]
    pub payments: Vec<MerchantOrderPayment>,
    #[serde(default)]
    pub payer: Option<Payer>,
}

/// What a webhook notification resolves to, whichever resource it named.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub external_reference: Option<String>,
    /// Provider status as reported, before mapping to an order status.
    pub status: Option<String>,
    pub payment_id: Option<ProviderId>,
    pub payer_email: Option<String>,
}

impl From<Payment> for PaymentOutcome {
    fn from(payment: Payment) -> Self {
        Self {
            external_reference: payment.external_reference,
            status: payment.status.map(String::from),
            payment_id: Some(payment.id),
            payer_email: payment.payer.and_then(|p| p.email),
        }
    }
}

impl From<MerchantOrder> for PaymentOutcome {
    fn from(order: MerchantOrder) -> Self {
        let first = order.payments.into_iter().next();
        let status = order
            .order_status
            .filter(|s| !s.is_empty())
            .or_else(|| first.as_ref().and_then(|p| p.status.clone()).map(String::from));
        Self {
            external_reference: order.external_reference,
            status,
            payment_id: first.map(|p| p.id),
            payer_email: order.payer.and_then(|p| p.email),
        }
    }
}

impl PaymentOutcome {
    /// Provider status, treating an absent one as `pending`.
    #[must_use]
    pub fn payment_status(&self) -> PaymentStatus {
        self.status
            .as_deref()
            .map_or(PaymentStatus::Pending, PaymentStatus::from)
    }
}
