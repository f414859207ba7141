//! Shipping quotes.
//!
//! National flat rate below the free-shipping threshold, free at or above it.
//! The destination is accepted so zone pricing can be added without touching
//! callers; it does not affect the price today.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat national shipping fee, in UYU.
pub const FLAT_RATE: Decimal = Decimal::from_parts(180, 0, 0, false, 0);

/// Subtotal from which shipping is free, in UYU.
pub const FREE_SHIPPING_FROM: Decimal = Decimal::from_parts(2000, 0, 0, false, 0);

/// Method id of the paid tier.
pub const FLAT_RATE_METHOD: &str = "flat_rate";

/// Method id of the free tier.
pub const FREE_SHIPPING_METHOD: &str = "flat_rate_free";

/// Where the order ships to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
}

/// A priced shipping line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub method_id: String,
    pub method_title: String,
    /// Cost in the store currency.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub free: bool,
}

impl ShippingQuote {
    /// The free tier.
    #[must_use]
    pub fn free_shipping() -> Self {
        Self {
            method_id: FREE_SHIPPING_METHOD.to_string(),
            method_title: "Envío gratis".to_string(),
            total: Decimal::ZERO,
            free: true,
        }
    }

    /// The paid tier at the given fee.
    #[must_use]
    pub fn flat_rate(fee: Decimal) -> Self {
        Self {
            method_id: FLAT_RATE_METHOD.to_string(),
            method_title: "Envío estándar".to_string(),
            total: fee,
            free: false,
        }
    }
}

/// Shipping price policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingRules {
    pub flat_fee: Decimal,
    pub free_from: Decimal,
}

impl Default for ShippingRules {
    fn default() -> Self {
        Self {
            flat_fee: FLAT_RATE,
            free_from: FREE_SHIPPING_FROM,
        }
    }
}

impl ShippingRules {
    /// Quote shipping for an order subtotal.
    #[must_use]
    pub fn quote(&self, subtotal: Decimal, _destination: Option<&Destination>) -> ShippingQuote {
        if subtotal >= self.free_from {
            ShippingQuote::free_shipping()
        } else {
            ShippingQuote::flat_rate(self.flat_fee)
        }
    }
}

/// Quote shipping with the default store policy.
#[must_use]
pub fn quote(subtotal: Decimal, destination: Option<&Destination>) -> ShippingQuote {
    ShippingRules::default().quote(subtotal, destination)
}
