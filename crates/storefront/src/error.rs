//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Route handlers return `Result<T, AppError>`; the
//! client always receives `{ "ok": false, "error": "..." }` and never the
//! upstream error detail.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::mercadopago::PaymentError;
use crate::woocommerce::CommerceError;

/// Message returned for every server-side failure.
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Message returned for malformed request bodies.
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid payload";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// WooCommerce operation failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// MercadoPago operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller failed the shared-secret check.
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A 400 with the standard payload message.
    #[must_use]
    pub fn invalid_payload() -> Self {
        Self::BadRequest(INVALID_PAYLOAD_MESSAGE.to_string())
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Commerce(_) | Self::Payment(_) | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, message) = match &self {
            Self::Commerce(_) | Self::Payment(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                SERVER_ERROR_MESSAGE.to_string(),
            ),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "Not found".to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // Nothing to tell a caller that failed the secret check
            Self::Unauthorized => return StatusCode::UNAUTHORIZED.into_response(),
        };

        (status, Json(json!({ "ok": false, "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for checkout steps.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
