//! Currency codes for amounts sent to the payment provider.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unsupported [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency: {0}")]
pub struct ParseCurrencyError(pub String);

/// ISO 4217 currency codes accepted by the payment provider in our markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Uruguayan peso.
    #[default]
    UYU,
    /// US dollar.
    USD,
    /// Argentine peso.
    ARS,
    /// Brazilian real.
    BRL,
}

impl CurrencyCode {
    /// The three-letter code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UYU => "UYU",
            Self::USD => "USD",
            Self::ARS => "ARS",
            Self::BRL => "BRL",
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UYU" => Ok(Self::UYU),
            "USD" => Ok(Self::USD),
            "ARS" => Ok(Self::ARS),
            "BRL" => Ok(Self::BRL),
            _ => Err(ParseCurrencyError(s.to_string())),
        }
    }
}
