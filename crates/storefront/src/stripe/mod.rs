//! Stripe Checkout client.
//!
//! # Architecture
//!
//! - Plain `reqwest` calls against the Stripe REST API; Stripe is treated as
//!   an opaque remote service and only the fields we need are modelled
//! - Requests are form-encoded (Stripe's wire format) with the secret key as
//!   a bearer token and a pinned `Stripe-Version`
//! - Every call is bounded by the configured outbound timeout
//! - No retries: creating a session is not idempotent, so failures go straight
//!   back to the caller
//!
//! # Example
//!
//! ```rust,ignore
//! use kebab_storefront::stripe::{CallbackUrls, StripeClient};
//!
//! let client = StripeClient::new(&config.stripe, config.outbound_timeout)?;
//! let urls = CallbackUrls::for_origin("https://kebab.example");
//! let session = client.create_checkout_session(&order, &urls).await?;
//! // redirect the browser to session.url
//! ```

mod client;

pub use client::{CallbackUrls, CheckoutSession, StripeClient, session_form};

use thiserror::Error;

/// Errors that can occur when talking to Stripe.
#[derive(Debug, Error)]
pub enum StripeError {
    /// No secret key is configured.
    #[error("Stripe secret key is not configured")]
    NotConfigured,

    /// The call exceeded the outbound timeout.
    #[error("Stripe request timed out")]
    Timeout,

    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// Stripe rejected the request.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status returned by Stripe.
        status: u16,
        /// Stripe's human-readable message.
        message: String,
        /// Stripe's error type (e.g. `invalid_request_error`).
        kind: Option<String>,
    },

    /// Stripe answered 2xx but the session has no redirect URL.
    #[error("Checkout session {0} has no URL")]
    MissingUrl(String),

    /// The response body could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl StripeError {
    /// Message safe to return to the browser.
    ///
    /// Provider rejections carry Stripe's own message; transport failures are
    /// replaced by a fixed description.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::NotConfigured => "Payment provider is not configured".to_string(),
            Self::Timeout => "Payment provider timed out".to_string(),
            Self::Http(_) => "Payment provider unreachable".to_string(),
            Self::Api { message, .. } => message.clone(),
            Self::MissingUrl(_) => "Payment provider returned no checkout URL".to_string(),
            Self::Parse(_) => "Payment provider returned an unexpected response".to_string(),
        }
    }
}

impl From<reqwest::Error> for StripeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_message_carries_provider_message() {
        let err = StripeError::Api {
            status: 400,
            message: "Invalid email address: nope".to_string(),
            kind: Some("invalid_request_error".to_string()),
        };
        assert_eq!(err.public_message(), "Invalid email address: nope");
        assert_eq!(
            err.to_string(),
            "API error: 400 - Invalid email address: nope"
        );
    }

    #[test]
    fn test_public_message_hides_transport_details() {
        assert_eq!(
            StripeError::Timeout.public_message(),
            "Payment provider timed out"
        );
        assert_eq!(
            StripeError::Parse("expected value at line 1".to_string()).public_message(),
            "Payment provider returned an unexpected response"
        );
        assert_eq!(
            StripeError::NotConfigured.public_message(),
            "Payment provider is not configured"
        );
    }
}
