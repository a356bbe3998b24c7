//! Stripe API client implementation.

use std::sync::Arc;
use std::time::Duration;

use kebab_core::{CheckoutOrder, CheckoutSessionId, Currency};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::StripeError;
use crate::config::StripeConfig;

/// Redirect targets for the hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackUrls {
    /// Where Stripe sends the customer after paying.
    pub success_url: String,
    /// Where Stripe sends the customer after backing out.
    pub cancel_url: String,
}

impl CallbackUrls {
    /// Callback URLs that return to the storefront home page at `origin`.
    #[must_use]
    pub fn for_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            success_url: format!("{origin}/?payment=success"),
            cancel_url: format!("{origin}/?payment=cancelled"),
        }
    }
}

/// A created Checkout Session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Stripe session id (`cs_...`).
    pub id: CheckoutSessionId,
    /// Hosted payment page the customer is redirected to.
    pub url: String,
}

#[derive(Deserialize)]
struct SessionResponse {
    id: CheckoutSessionId,
    url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Build the form-encoded body of a Checkout Session request.
///
/// One `price_data` line per item, single-capture payment mode, card only.
#[must_use]
pub fn session_form(order: &CheckoutOrder, urls: &CallbackUrls) -> Vec<(String, String)> {
    let currency = Currency::default();
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("success_url".to_string(), urls.success_url.clone()),
        ("cancel_url".to_string(), urls.cancel_url.clone()),
    ];

    for (i, item) in order.items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((
            format!("{prefix}[price_data][currency]"),
            currency.code().to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.amount.to_string(),
        ));
        form.push((format!("{prefix}[quantity]"), item.quantity.get().to_string()));
    }

    if let Some(email) = &order.customer_email {
        form.push(("customer_email".to_string(), email.to_string()));
    }

    form
}

/// Client for the Stripe Checkout Sessions API.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
    secret_key: Option<SecretString>,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig, timeout: Duration) -> Result<Self, StripeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(StripeClientInner {
                client,
                endpoint: format!(
                    "{}/v1/checkout/sessions",
                    config.api_base.trim_end_matches('/')
                ),
                api_version: config.api_version.clone(),
                secret_key: config.secret_key.clone(),
            }),
        })
    }

    /// Whether a secret key is available.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.secret_key.is_some()
    }

    /// Create a hosted Checkout Session for `order`.
    ///
    /// # Errors
    ///
    /// Returns an error if no secret key is configured, the request fails or
    /// times out, Stripe rejects it, or the session comes back without a URL.
    #[instrument(skip(self, order, urls), fields(items = order.items.len()))]
    pub async fn create_checkout_session(
        &self,
        order: &CheckoutOrder,
        urls: &CallbackUrls,
    ) -> Result<CheckoutSession, StripeError> {
        let secret_key = self
            .inner
            .secret_key
            .as_ref()
            .ok_or(StripeError::NotConfigured)?;

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .bearer_auth(secret_key.expose_secret())
            .header("Stripe-Version", &self.inner.api_version)
            .form(&session_form(order, urls))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let (message, kind) = serde_json::from_str::<ErrorResponse>(&body).map_or_else(
                |_| (None, None),
                |parsed| (parsed.error.message, parsed.error.kind),
            );
            let message = message.unwrap_or_else(|| format!("Stripe returned HTTP {status}"));

            warn!(
                status = %status,
                kind = kind.as_deref().unwrap_or("unknown"),
                message = %message,
                "Stripe rejected checkout session"
            );
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
                kind,
            });
        }

        let session: SessionResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Failed to parse Stripe checkout session");
            StripeError::Parse(e.to_string())
        })?;

        let url = session
            .url
            .ok_or_else(|| StripeError::MissingUrl(session.id.to_string()))?;

        info!(session_id = %session.id, "Checkout session created");
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("endpoint", &self.inner.endpoint)
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}
