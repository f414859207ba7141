//! MercadoPago Checkout Pro client.
//!
//! Creates payment preferences for pending orders and resolves webhook
//! notifications back to the payment or merchant order they refer to.

mod client;
pub mod types;

pub use client::MercadoPagoClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to MercadoPago.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("MercadoPago {operation} failed with status {status}")]
    Status { status: u16, operation: &'static str },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("MP_ACCESS_TOKEN not configured")]
    MissingToken,
}

/// Operations the storefront needs from the payment provider.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    /// Create a hosted-checkout preference.
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<Preference, PaymentError>;

    /// Look up a payment by id.
    async fn payment(&self, id: &str) -> Result<Payment, PaymentError>;

    /// Look up a merchant order by id.
    async fn merchant_order(&self, id: &str) -> Result<MerchantOrder, PaymentError>;
}
