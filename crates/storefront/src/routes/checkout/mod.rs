//! Checkout API: pricing, order creation and payment initiation.

pub mod order;
pub mod payment;
pub mod summary;
pub mod validate_cart;

use rust_decimal::Decimal;
use serde::Serialize;
use tienda_core::ShippingQuote;

/// Cart totals as reported to the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    #[serde(with = "rust_decimal::serde::float")]
    pub items: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(rename = "grandTotal", with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
}

impl Totals {
    /// Totals for an item subtotal and its shipping quote. Discounts are not
    /// supported yet and are always zero.
    #[must_use]
    pub fn new(items: Decimal, shipping: &ShippingQuote) -> Self {
        Self {
            items,
            shipping: shipping.total,
            discount: Decimal::ZERO,
            grand_total: items + shipping.total,
        }
    }

    /// All-zero totals for an empty cart.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            items: Decimal::ZERO,
            shipping: Decimal::ZERO,
            discount: Decimal::ZERO,
            grand_total: Decimal::ZERO,
        }
    }
}
