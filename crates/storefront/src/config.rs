//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; a storefront with no payment secret still
//! proxies content, and reports itself not ready.
//!
//! ## Server
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL, used when a request carries no usable origin
//!   (default: <http://localhost:3000>)
//! - `STOREFRONT_ENV` - Deployment environment name (e.g. `production`)
//! - `STOREFRONT_OUTBOUND_TIMEOUT_SECS` - Upper bound on payment/content calls (default: 10)
//!
//! ## Content backend
//! - `CONTENT_GRAPHQL_ENDPOINT` - GraphQL endpoint of the headless CMS
//! - `CONTENT_BASE_URL` - CMS base URL; the endpoint defaults to `<base>/graphql`
//!   (default: <http://localhost:1337>)
//! - `CONTENT_API_TOKEN` - Bearer token for the CMS (server-side only)
//!
//! ## Payments
//! - `STRIPE_SECRET_KEY` - Stripe secret (`sk_`) or restricted (`rk_`) key, server-side only
//! - `STRIPE_API_BASE` - Stripe API base URL (default: <https://api.stripe.com>)
//!
//! ## Error tracking
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Stripe API version pinned for checkout session requests.
pub const STRIPE_API_VERSION: &str = "2025-09-30.clover";

/// Mean information per byte below which a token is assumed hand-typed.
const MIN_BITS_PER_BYTE: f64 = 3.3;

/// Fragments that only show up in copied `.env.example` values.
const PLACEHOLDER_FRAGMENTS: [&str; 9] = [
    "changeme",
    "placeholder",
    "replace",
    "your-",
    "your_",
    "xxx",
    "todo",
    "insert",
    "example",
];

/// Prefixes of Stripe server-side keys (`pk_` publishable keys cannot create
/// sessions).
const STRIPE_KEY_PREFIXES: [&str; 2] = ["sk_", "rk_"];

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
    /// Public base URL for the storefront
    pub base_url: String,
    /// Deployment environment name
    pub environment: Option<String>,
    /// Upper bound on any outbound HTTP call
    pub outbound_timeout: Duration,
    /// Headless CMS configuration
    pub content: ContentConfig,
    /// Stripe configuration
    pub stripe: StripeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Headless CMS configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct ContentConfig {
    /// Explicit GraphQL endpoint, if configured
    pub graphql_endpoint: Option<String>,
    /// CMS base URL (fallback for the endpoint)
    pub base_url: String,
    /// Bearer token attached to every proxied query
    pub api_token: Option<SecretString>,
}

impl ContentConfig {
    /// The endpoint queries are forwarded to.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.graphql_endpoint.clone().unwrap_or_else(|| {
            format!("{}/graphql", self.base_url.trim_end_matches('/'))
        })
    }
}

impl std::fmt::Debug for ContentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentConfig")
            .field("graphql_endpoint", &self.graphql_endpoint)
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Stripe configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (server-side only)
    pub secret_key: Option<SecretString>,
    /// API base URL
    pub api_base: String,
    /// Pinned API version
    pub api_version: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or a secret fails
    /// validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_url_or_default("STOREFRONT_BASE_URL", "http://localhost:3000")?;
        let environment = get_optional_env("STOREFRONT_ENV");
        let timeout_secs: u64 = parse_env("STOREFRONT_OUTBOUND_TIMEOUT_SECS", "10")?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_OUTBOUND_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let content = ContentConfig::from_env()?;
        let stripe = StripeConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            environment,
            outbound_timeout: Duration::from_secs(timeout_secs),
            content,
            stripe,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// The values `from_env` produces when nothing is set: local addresses, no
/// secrets.
impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            environment: None,
            outbound_timeout: Duration::from_secs(10),
            content: ContentConfig::default(),
            stripe: StripeConfig::default(),
            sentry_dsn: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            graphql_endpoint: None,
            base_url: "http://localhost:1337".to_string(),
            api_token: None,
        }
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            api_base: "https://api.stripe.com".to_string(),
            api_version: STRIPE_API_VERSION.to_string(),
        }
    }
}

impl ContentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let graphql_endpoint = get_optional_env("CONTENT_GRAPHQL_ENDPOINT");
        if let Some(endpoint) = &graphql_endpoint {
            validate_url(endpoint, "CONTENT_GRAPHQL_ENDPOINT")?;
        }

        Ok(Self {
            graphql_endpoint,
            base_url: get_url_or_default("CONTENT_BASE_URL", "http://localhost:1337")?,
            api_token: optional_secret("CONTENT_API_TOKEN")?,
        })
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: stripe_secret("STRIPE_SECRET_KEY")?,
            api_base: get_url_or_default("STRIPE_API_BASE", "https://api.stripe.com")?,
            api_version: STRIPE_API_VERSION.to_string(),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a URL-valued variable, validated as an absolute http(s) URL.
fn get_url_or_default(key: &str, default: &str) -> Result<String, ConfigError> {
    let value = get_env_or_default(key, default);
    validate_url(&value, key)?;
    Ok(value.trim_end_matches('/').to_string())
}

fn validate_url(value: &str, key: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(())
}

/// Shannon entropy of `value`, in bits per byte.
fn bits_per_byte(value: &str) -> f64 {
    let mut counts = [0u32; 256];
    for byte in value.bytes() {
        if let Some(n) = counts.get_mut(usize::from(byte)) {
            *n += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)] // env values are far below 2^52 bytes
    let total = value.len() as f64;
    counts
        .iter()
        .filter(|&&n| n > 0)
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}

/// Reject values that are obviously not a real credential.
fn check_secret(key: &str, value: &str) -> Result<(), ConfigError> {
    let insecure = |reason: String| Err(ConfigError::InsecureSecret(key.to_string(), reason));

    let lowered = value.to_ascii_lowercase();
    if let Some(fragment) = PLACEHOLDER_FRAGMENTS.iter().find(|f| lowered.contains(*f)) {
        return insecure(format!("looks like a placeholder (contains '{fragment}')"));
    }

    let bits = bits_per_byte(value);
    if bits < MIN_BITS_PER_BYTE {
        return insecure(format!(
            "too predictable ({bits:.2} bits per byte, minimum {MIN_BITS_PER_BYTE})"
        ));
    }

    Ok(())
}

/// Read an optional secret, check it, and wrap it.
fn optional_secret(key: &str) -> Result<Option<SecretString>, ConfigError> {
    let Some(value) = get_optional_env(key) else {
        return Ok(None);
    };
    check_secret(key, &value)?;
    Ok(Some(SecretString::from(value)))
}

/// Read the Stripe key; on top of [`check_secret`] it must be a server key.
fn stripe_secret(key: &str) -> Result<Option<SecretString>, ConfigError> {
    let secret = optional_secret(key)?;
    if let Some(value) = &secret {
        let exposed = value.expose_secret();
        if !STRIPE_KEY_PREFIXES.iter().any(|p| exposed.starts_with(p)) {
            return Err(ConfigError::InsecureSecret(
                key.to_string(),
                "expected a secret (sk_) or restricted (rk_) key".to_string(),
            ));
        }
    }
    Ok(secret)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn content(endpoint: Option<&str>, base_url: &str) -> ContentConfig {
        ContentConfig {
            graphql_endpoint: endpoint.map(str::to_string),
            base_url: base_url.to_string(),
            api_token: Some(SecretString::from("strapi_token_8f3Kq9")),
        }
    }

    #[test]
    fn test_bits_per_byte() {
        assert!(bits_per_byte("zzzz").abs() < f64::EPSILON);
        assert!((bits_per_byte("abab") - 1.0).abs() < 1e-9);
        assert!((bits_per_byte("abcd") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_check_secret_rejects_placeholders() {
        for value in ["your-stripe-key", "sk_test_CHANGEME_9f8e7d", "xxxxxxxx"] {
            assert!(
                matches!(
                    check_secret("STRIPE_SECRET_KEY", value),
                    Err(ConfigError::InsecureSecret(..))
                ),
                "value: {value}"
            );
        }
    }

    #[test]
    fn test_check_secret_rejects_repetitive_tokens() {
        let err = check_secret("CONTENT_API_TOKEN", "abababababababab").unwrap_err();
        assert!(err.to_string().contains("too predictable"));
    }

    #[test]
    fn test_check_secret_accepts_provider_keys() {
        assert!(
            check_secret(
                "STRIPE_SECRET_KEY",
                "sk_test_51NzQ8hKc3vR7yT2mWpLx9aBdEfGhJkLmNoPqRsTuVwXyZ"
            )
            .is_ok()
        );
        assert!(check_secret("CONTENT_API_TOKEN", "cms_7Gh2Kq9vRzP4xLmW").is_ok());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://cms.example.org/graphql", "X").is_ok());
        assert!(validate_url("ftp://cms/graphql", "X").is_err());
        assert!(validate_url("not a url", "X").is_err());
    }

    #[test]
    fn test_content_endpoint_fallback() {
        assert_eq!(
            content(None, "http://localhost:1337/").endpoint(),
            "http://localhost:1337/graphql"
        );
        assert_eq!(
            content(Some("https://cms.kebab.test/api/graphql"), "http://localhost:1337").endpoint(),
            "https://cms.kebab.test/api/graphql"
        );
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            port: 8080,
            ..StorefrontConfig::default()
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_defaults_have_no_secrets() {
        let config = StorefrontConfig::default();
        assert!(config.stripe.secret_key.is_none());
        assert!(config.content.api_token.is_none());
        assert_eq!(config.content.endpoint(), "http://localhost:1337/graphql");
        assert_eq!(config.stripe.api_version, "2025-09-30.clover");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let stripe = StripeConfig {
            secret_key: Some(SecretString::from("sk_live_super_secret_value")),
            api_base: "https://api.stripe.com".to_string(),
            api_version: STRIPE_API_VERSION.to_string(),
        };
        let content = content(Some("https://cms.kebab.test/graphql"), "http://localhost:1337");

        let debug_output = format!("{stripe:?} {content:?}");

        assert!(debug_output.contains("https://api.stripe.com"));
        assert!(debug_output.contains("https://cms.kebab.test/graphql"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_live_super_secret_value"));
        assert!(!debug_output.contains("strapi_token_8f3Kq9"));
    }
}
