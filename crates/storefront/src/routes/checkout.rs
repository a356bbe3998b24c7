//! Checkout route handler.
//!
//! Turns the browser's cart into a hosted Stripe Checkout Session and hands
//! back the URL to redirect to. Nothing is stored server-side; the cart stays
//! in the browser until the customer returns from the payment page.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header},
};
use kebab_core::CheckoutRequest;
use serde::Serialize;
use tracing::instrument;
use url::Url;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;
use crate::stripe::CallbackUrls;

/// Successful checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Hosted payment page URL.
    pub url: String,
}

/// Create a Stripe Checkout Session for the posted cart.
#[instrument(skip(state, headers, payload))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        AppError::InvalidCheckout(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let order = request
        .validate()
        .map_err(|e| AppError::InvalidCheckout(e.to_string()))?;

    let origin = request_origin(&headers, &state.config().base_url);
    let urls = CallbackUrls::for_origin(&origin);

    let item_count = order.items.len().to_string();
    add_breadcrumb(
        "checkout",
        "Creating checkout session",
        Some(&[("items", item_count.as_str()), ("origin", origin.as_str())]),
    );

    let session = state
        .stripe()
        .create_checkout_session(&order, &urls)
        .await?;

    tracing::info!(session_id = %session.id, items = order.items.len(), "Checkout started");
    Ok(Json(CheckoutResponse { url: session.url }))
}

/// Work out the public origin of this deployment for the Stripe callbacks.
///
/// Uses the forwarded or direct host the request arrived on, then `fallback`
/// (the configured base URL). The caller's `Origin` header is not consulted:
/// the customer must come back here, not to whichever page posted the cart.
#[must_use]
pub fn request_origin(headers: &HeaderMap, fallback: &str) -> String {
    let host = header_str(headers, "x-forwarded-host")
        .and_then(first_value)
        .or_else(|| header_str(headers, header::HOST.as_str()));

    if let Some(host) = host {
        let proto = header_str(headers, "x-forwarded-proto")
            .and_then(first_value)
            .filter(|p| matches!(*p, "http" | "https"))
            .unwrap_or("http");

        if let Some(origin) = http_origin(&format!("{proto}://{host}")) {
            return origin;
        }
    }

    fallback.trim_end_matches('/').to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// First entry of a comma-separated proxy header.
fn first_value(value: &str) -> Option<&str> {
    value
        .split(',')
        .next()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Serialized origin of an absolute http(s) URL without credentials or path.
fn http_origin(candidate: &str) -> Option<String> {
    let url = Url::parse(candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    if !url.username().is_empty() || url.password().is_some() {
        return None;
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return None;
    }
    Some(url.origin().ascii_serialization())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const FALLBACK: &str = "http://localhost:3000";

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_origin_header_is_ignored() {
        let h = headers(&[
            ("origin", "https://attacker.example"),
            ("host", "order.kebab.example"),
        ]);
        assert_eq!(request_origin(&h, FALLBACK), "http://order.kebab.example");

        let h = headers(&[("origin", "https://attacker.example")]);
        assert_eq!(request_origin(&h, FALLBACK), FALLBACK);
    }

    #[test]
    fn test_host_keeps_port() {
        let h = headers(&[("host", "localhost:5173")]);
        assert_eq!(request_origin(&h, FALLBACK), "http://localhost:5173");
    }

    #[test]
    fn test_forwarded_headers() {
        let h = headers(&[
            ("x-forwarded-proto", "https, http"),
            ("x-forwarded-host", "shop.kebab.example, edge.internal"),
            ("host", "10.0.0.4:3000"),
        ]);
        assert_eq!(request_origin(&h, FALLBACK), "https://shop.kebab.example");
    }

    #[test]
    fn test_unknown_proto_defaults_to_http() {
        let h = headers(&[("x-forwarded-proto", "gopher"), ("host", "kebab.example")]);
        assert_eq!(request_origin(&h, FALLBACK), "http://kebab.example");
    }

    #[test]
    fn test_host_with_path_is_ignored() {
        let h = headers(&[("host", "evil.example/phish")]);
        assert_eq!(request_origin(&h, FALLBACK), FALLBACK);
    }

    #[test]
    fn test_fallback_when_no_headers() {
        assert_eq!(
            request_origin(&HeaderMap::new(), "https://kebab.example/"),
            "https://kebab.example"
        );
    }
}
