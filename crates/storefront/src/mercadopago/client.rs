use std::sync::Arc;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::form_urlencoded;

use super::types::{MerchantOrder, Payment, Preference, PreferenceRequest};
use super::{PaymentBackend, PaymentError};
use crate::config::MercadoPagoConfig;

/// `reqwest` implementation of [`PaymentBackend`].
#[derive(Clone)]
pub struct MercadoPagoClient {
    inner: Arc<MercadoPagoClientInner>,
}

struct MercadoPagoClientInner {
    http: reqwest::Client,
    api_base: String,
    access_token: Option<SecretString>,
}

impl MercadoPagoClient {
    /// Create a new MercadoPago client.
    ///
    /// A missing access token is not an error here; calls fail with
    /// [`PaymentError::MissingToken`] instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &MercadoPagoConfig) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tienda-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(MercadoPagoClientInner {
                http,
                api_base: config.api_base.clone(),
                access_token: config.access_token.clone(),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.api_base)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> Result<T, PaymentError> {
        let token = self
            .inner
            .access_token
            .as_ref()
            .ok_or(PaymentError::MissingToken)?;

        let response = request.bearer_auth(token.expose_secret()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation,
                body = %body.chars().take(500).collect::<String>(),
                "MercadoPago request failed"
            );
            return Err(PaymentError::Status {
                status: status.as_u16(),
                operation,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Percent-encode an id for use as a single path segment.
fn path_segment(id: &str) -> String {
    form_urlencoded::byte_serialize(id.as_bytes()).collect()
}

#[async_trait]
impl PaymentBackend for MercadoPagoClient {
    #[instrument(skip(self, request), fields(external_reference = %request.external_reference))]
    async fn create_preference(
        &self,
        request: &PreferenceRequest,
    ) -> Result<Preference, PaymentError> {
        let url = self.url("/checkout/preferences");
        self.execute(self.inner.http.post(url).json(request), "create preference")
            .await
    }

    #[instrument(skip(self))]
    async fn payment(&self, id: &str) -> Result<Payment, PaymentError> {
        let url = self.url(&format!("/v1/payments/{}", path_segment(id)));
        self.execute(self.inner.http.get(url), "get payment").await
    }

    #[instrument(skip(self))]
    async fn merchant_order(&self, id: &str) -> Result<MerchantOrder, PaymentError> {
        let url = self.url(&format!("/merchant_orders/{}", path_segment(id)));
        self.execute(self.inner.http.get(url), "get merchant order")
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tienda_core::CurrencyCode;

    use super::*;

    fn config(token: Option<&str>) -> MercadoPagoConfig {
        MercadoPagoConfig {
            api_base: "http://127.0.0.1:9".to_string(),
            access_token: token.map(SecretString::from),
            currency: CurrencyCode::UYU,
            webhook_secret: None,
            success_path: "/checkout/exito".to_string(),
            failure_path: "/checkout/error".to_string(),
            pending_path: "/checkout/pendiente".to_string(),
        }
    }

    #[test]
    fn test_path_segment_encodes_separators() {
        assert_eq!(path_segment("123"), "123");
        assert_eq!(path_segment("../users"), "..%2Fusers");
    }

    #[tokio::test]
    async fn test_missing_token_fails_without_request() {
        let client = MercadoPagoClient::new(&config(None)).unwrap();
        let err = client.payment("123").await.unwrap_err();
        assert!(matches!(err, PaymentError::MissingToken));
        assert_eq!(err.to_string(), "MP_ACCESS_TOKEN not configured");
    }
}
