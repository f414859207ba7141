//! Coercion of loosely-typed numeric fields.
//!
//! Checkout payloads come from browsers that are not strict about whether a
//! quantity is `2` or `"2"`. [`LenientNumber`] accepts either shape at the
//! deserialization boundary; everything past it works with concrete types.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A JSON number, or a string that should be read as one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LenientNumber {
    /// A JSON number.
    Number(serde_json::Number),
    /// A string holding a number (possibly with surrounding whitespace).
    Text(String),
}

impl LenientNumber {
    /// Interpret the value as an `f64`.
    ///
    /// Returns `None` for non-numeric strings and non-finite results.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        }?;
        value.is_finite().then_some(value)
    }

    /// Interpret the value as an exact decimal amount.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => parse_decimal(&n.to_string()),
            Self::Text(s) => parse_decimal(s),
        }
    }

    /// Interpret the value as a positive integer id.
    #[must_use]
    pub fn as_id(&self) -> Option<u64> {
        match self {
            Self::Number(n) => n.as_u64(),
            Self::Text(s) => s.trim().parse::<u64>().ok(),
        }
    }
}

impl std::fmt::Display for LenientNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s.trim()),
        }
    }
}

impl From<u64> for LenientNumber {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for LenientNumber {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Normalize a requested line quantity.
///
/// Missing, zero, negative, and non-numeric inputs all become `1`;
/// fractional quantities are floored.
#[must_use]
pub fn normalize_quantity(raw: Option<&LenientNumber>) -> u32 {
    let value = raw.and_then(LenientNumber::as_f64).unwrap_or(1.0).floor();
    if value < 1.0 {
        return 1;
    }
    if value >= f64::from(u32::MAX) {
        return u32::MAX;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above
    let quantity = value as u32;
    quantity
}

/// Parse a price string as reported by the commerce backend.
///
/// Unparseable or empty strings are worth zero.
#[must_use]
pub fn parse_amount(raw: &str) -> Decimal {
    parse_decimal(raw).unwrap_or(Decimal::ZERO)
}
