//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Server
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SITE_URL` - Public URL of the storefront, used to build payment redirect
//!   and notification URLs (default: empty, producing relative URLs)
//!
//! ## WooCommerce
//! - `WP_JSON_URL` (or `WP_API_URL`, `WC_BASE_URL`) - WordPress REST root
//! - `WC_CONSUMER_KEY` / `WC_CONSUMER_SECRET` - REST API key pair
//! - `WC_CACHE_TTL_SECS` - Read cache TTL (default: 60)
//! - `WC_CACHE_CAPACITY` - Read cache entries (default: 1000)
//! - `SUMMARY_CACHE_TTL_SECS` - Checkout summary product cache TTL (default: 300)
//!
//! ## Mercado Pago
//! - `MP_ACCESS_TOKEN` - Server access token
//! - `MP_API_BASE` - API root (default: <https://api.mercadopago.com>)
//! - `MP_CURRENCY` - Preference currency (default: UYU)
//! - `MP_WEBHOOK_SECRET` - Shared secret expected as `?token=` on notifications
//! - `MP_SUCCESS_URL`, `MP_FAILURE_URL`, `MP_PENDING_URL` - Redirect paths
//!
//! ## Observability
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! Backend credentials are optional at load time. A missing key pair or token
//! is reported by the client that needs it, on the request that needs it.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tienda_core::CurrencyCode;

const DEFAULT_MP_API_BASE: &str = "https://api.mercadopago.com";
const MIN_WEBHOOK_SECRET_LENGTH: usize = 16;

/// Values that show up when someone copies `.env.example` without editing it.
const PLACEHOLDER_PATTERNS: &[&str] = &["changeme", "replace", "placeholder", "your-", "xxx"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without trailing slash
    pub site_url: String,
    /// WooCommerce REST API configuration
    pub woocommerce: WooCommerceConfig,
    /// Mercado Pago configuration
    pub mercadopago: MercadoPagoConfig,
    /// TTL of the product cache used by the checkout summary
    pub summary_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// WooCommerce REST API configuration.
#[derive(Clone)]
pub struct WooCommerceConfig {
    /// WordPress REST root, normalized to end in `/wp-json`
    pub base_url: Option<String>,
    pub consumer_key: Option<SecretString>,
    pub consumer_secret: Option<SecretString>,
    /// How long GET responses are served from memory
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
}

impl std::fmt::Debug for WooCommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooCommerceConfig")
            .field("base_url", &self.base_url)
            .field("consumer_key", &redacted(self.consumer_key.as_ref()))
            .field("consumer_secret", &redacted(self.consumer_secret.as_ref()))
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

/// Mercado Pago Checkout Pro configuration.
#[derive(Clone)]
pub struct MercadoPagoConfig {
    pub api_base: String,
    pub access_token: Option<SecretString>,
    pub currency: CurrencyCode,
    /// Shared secret carried as `?token=` on the notification URL
    pub webhook_secret: Option<SecretString>,
    pub success_path: String,
    pub failure_path: String,
    pub pending_path: String,
}

impl std::fmt::Debug for MercadoPagoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MercadoPagoConfig")
            .field("api_base", &self.api_base)
            .field("access_token", &redacted(self.access_token.as_ref()))
            .field("currency", &self.currency)
            .field("webhook_secret", &redacted(self.webhook_secret.as_ref()))
            .field("success_path", &self.success_path)
            .field("failure_path", &self.failure_path)
            .field("pending_path", &self.pending_path)
            .finish()
    }
}

const fn redacted(secret: Option<&SecretString>) -> &'static str {
    match secret {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if the
    /// webhook secret looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let host = env
            .or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string()))?;
        let port = env.parsed("STOREFRONT_PORT", 3000_u16)?;
        let site_url = env
            .optional("SITE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_default();

        let woocommerce = WooCommerceConfig {
            base_url: env
                .optional("WP_JSON_URL")
                .or_else(|| env.optional("WP_API_URL"))
                .or_else(|| env.optional("WC_BASE_URL"))
                .map(|raw| normalize_wp_json_url(&raw)),
            consumer_key: env.secret("WC_CONSUMER_KEY"),
            consumer_secret: env.secret("WC_CONSUMER_SECRET"),
            cache_ttl: Duration::from_secs(env.parsed("WC_CACHE_TTL_SECS", 60_u64)?),
            cache_capacity: env.parsed("WC_CACHE_CAPACITY", 1000_u64)?,
        };

        let currency = env
            .or_default("MP_CURRENCY", "UYU")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("MP_CURRENCY".to_string(), e.to_string()))?;

        let webhook_secret = env.secret("MP_WEBHOOK_SECRET");
        if let Some(secret) = &webhook_secret {
            validate_webhook_secret(secret.expose_secret(), "MP_WEBHOOK_SECRET")?;
        }

        let mercadopago = MercadoPagoConfig {
            api_base: env
                .or_default("MP_API_BASE", DEFAULT_MP_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            access_token: env.secret("MP_ACCESS_TOKEN"),
            currency,
            webhook_secret,
            success_path: env.or_default("MP_SUCCESS_URL", "/checkout/exito"),
            failure_path: env.or_default("MP_FAILURE_URL", "/checkout/error"),
            pending_path: env.or_default("MP_PENDING_URL", "/checkout/pendiente"),
        };

        Ok(Self {
            host,
            port,
            site_url,
            woocommerce,
            mercadopago,
            summary_cache_ttl: Duration::from_secs(env.parsed("SUMMARY_CACHE_TTL_SECS", 300_u64)?),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute URL for a path on the public site.
    ///
    /// Absolute inputs (e.g., a redirect override pointing at another host)
    /// are returned unchanged.
    #[must_use]
    pub fn site_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{path}", self.site_url)
        } else {
            format!("{}/{path}", self.site_url)
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-empty value of a variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn secret(&self, key: &str) -> Option<SecretString> {
        self.optional(key).map(SecretString::from)
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Strip the trailing slash and make sure the URL points at `/wp-json`.
fn normalize_wp_json_url(raw: &str) -> String {
    let base = raw.trim().trim_end_matches('/');
    if base.contains("/wp-json") {
        base.to_string()
    } else {
        format!("{base}/wp-json")
    }
}

/// Reject webhook secrets that are too short to resist guessing or are
/// obviously unedited template values.
fn validate_webhook_secret(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }
    if secret.len() < MIN_WEBHOOK_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_WEBHOOK_SECRET_LENGTH} characters (got {})",
                secret.len()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_empty_environment() {
        let config = load(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(config.woocommerce.base_url.is_none());
        assert!(config.woocommerce.consumer_key.is_none());
        assert!(config.mercadopago.access_token.is_none());
        assert_eq!(config.mercadopago.api_base, DEFAULT_MP_API_BASE);
        assert_eq!(config.mercadopago.currency, CurrencyCode::UYU);
        assert_eq!(config.mercadopago.success_path, "/checkout/exito");
        assert_eq!(config.woocommerce.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.summary_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_wp_json_url_normalization() {
        assert_eq!(
            normalize_wp_json_url("https://shop.example.uy/"),
            "https://shop.example.uy/wp-json"
        );
        assert_eq!(
            normalize_wp_json_url("https://shop.example.uy/wp-json/"),
            "https://shop.example.uy/wp-json"
        );
    }

    #[test]
    fn test_base_url_fallback_order() {
        let config = load(&[
            ("WC_BASE_URL", "https://fallback.example.uy"),
            ("WP_API_URL", "https://api.example.uy/wp-json"),
        ])
        .unwrap();
        assert_eq!(
            config.woocommerce.base_url.as_deref(),
            Some("https://api.example.uy/wp-json")
        );
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("STOREFRONT_PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_invalid_currency() {
        assert!(load(&[("MP_CURRENCY", "XYZ")]).is_err());
    }

    #[test]
    fn test_webhook_secret_validation() {
        assert!(matches!(
            load(&[("MP_WEBHOOK_SECRET", "changeme-please-now")]),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(matches!(
            load(&[("MP_WEBHOOK_SECRET", "short")]),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(load(&[("MP_WEBHOOK_SECRET", "k3Jd9sQ2mX7pL0wZ")]).is_ok());
    }

    #[test]
    fn test_site_url_joining() {
        let config = load(&[("SITE_URL", "https://tienda.example.uy/")]).unwrap();
        assert_eq!(
            config.site_url("/checkout/exito"),
            "https://tienda.example.uy/checkout/exito"
        );
        assert_eq!(
            config.site_url("checkout/error"),
            "https://tienda.example.uy/checkout/error"
        );
        assert_eq!(
            config.site_url("https://pagos.example.uy/ok"),
            "https://pagos.example.uy/ok"
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[
            ("WC_CONSUMER_KEY", "ck_live_1234567890"),
            ("WC_CONSUMER_SECRET", "cs_live_0987654321"),
            ("MP_ACCESS_TOKEN", "APP_USR-abcdef"),
        ])
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("ck_live_1234567890"));
        assert!(!debug_output.contains("cs_live_0987654321"));
        assert!(!debug_output.contains("APP_USR-abcdef"));
    }
}
