//! Integration tests for Kebab House.
//!
//! Every test binds the real storefront router on an ephemeral port and
//! points it at in-process fake upstreams (Stripe, the CMS) that record what
//! they receive and answer with a canned reply. No network access and no
//! real credentials are needed:
//!
//! ```bash
//! cargo test -p kebab-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout` - Checkout session creation against a fake Stripe
//! - `gateway` - GraphQL relay against a fake CMS
//! - `cart_to_checkout` - Cart store feeding the checkout endpoint
//! - `service` - Health, config introspection, common headers

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use kebab_storefront::config::StorefrontConfig;
use kebab_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Stripe key handed to the storefront under test.
pub const STRIPE_TEST_KEY: &str = "sk_test_51QkZr8Lp2vXm9TnBc4HdEw";

/// CMS token handed to the storefront under test.
pub const CONTENT_TEST_TOKEN: &str = "cms_7Gh2Kq9vRzP4xLmW";

/// Outbound timeout used by test configurations.
pub const TEST_OUTBOUND_TIMEOUT: Duration = Duration::from_secs(2);

// =============================================================================
// Fake upstreams
// =============================================================================

/// A request captured by a [`FakeUpstream`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    /// A header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The body decoded as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn form(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(&self.body)
            .into_owned()
            .collect()
    }

    /// One form field.
    #[must_use]
    pub fn form_value(&self, key: &str) -> Option<String> {
        self.form()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// The body decoded as JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// The reply a [`FakeUpstream`] gives to every request.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl Canned {
    /// A JSON reply.
    #[must_use]
    pub fn json(status: StatusCode, body: &Value) -> Self {
        Self::raw(status, body.to_string())
    }

    /// A reply with an arbitrary body (still labelled JSON).
    #[must_use]
    pub fn raw(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// Hold the reply back for `delay`.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

struct FakeState {
    reply: Canned,
    requests: Mutex<Vec<Recorded>>,
}

/// An HTTP server on `127.0.0.1` that records requests and replies with a
/// [`Canned`] response on every path. Stops when dropped.
pub struct FakeUpstream {
    base_url: String,
    state: Arc<FakeState>,
    task: JoinHandle<()>,
}

impl FakeUpstream {
    /// Start a fake upstream.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(reply: Canned) -> Self {
        let state = Arc::new(FakeState {
            reply,
            requests: Mutex::new(Vec::new()),
        });
        let router = Router::new()
            .fallback(record_and_reply)
            .with_state(Arc::clone(&state));
        let (addr, task) = serve(router).await;

        Self {
            base_url: format!("http://{addr}"),
            state,
            task,
        }
    }

    /// `http://127.0.0.1:<port>`
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Everything received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn record_and_reply(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(Recorded {
            method,
            path: uri.path().to_string(),
            headers,
            body,
        });

    let reply = &state.reply;
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body.clone(),
    )
        .into_response()
}

/// Base URL of a port that was just released; connections to it are refused.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind scratch listener");
    let addr = listener.local_addr().expect("Failed to read scratch address");
    drop(listener);
    format!("http://{addr}")
}

async fn serve(router: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener
        .local_addr()
        .expect("Failed to read listener address");
    let task = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    (addr, task)
}

// =============================================================================
// Storefront under test
// =============================================================================

/// Configuration with no upstreams wired and a short outbound timeout.
#[must_use]
pub fn base_config() -> StorefrontConfig {
    StorefrontConfig {
        outbound_timeout: TEST_OUTBOUND_TIMEOUT,
        ..StorefrontConfig::default()
    }
}

/// Point the payment provider at `api_base` with [`STRIPE_TEST_KEY`].
#[must_use]
pub fn with_stripe(mut config: StorefrontConfig, api_base: &str) -> StorefrontConfig {
    config.stripe.api_base = api_base.to_string();
    config.stripe.secret_key = Some(SecretString::from(STRIPE_TEST_KEY));
    config
}

/// Point the CMS relay at `<base_url>/graphql` with [`CONTENT_TEST_TOKEN`].
#[must_use]
pub fn with_content(mut config: StorefrontConfig, base_url: &str) -> StorefrontConfig {
    config.content.graphql_endpoint = Some(format!("{base_url}/graphql"));
    config.content.api_token = Some(SecretString::from(CONTENT_TEST_TOKEN));
    config
}

/// A running storefront.
pub struct TestApp {
    base_url: String,
    client: reqwest::Client,
    task: JoinHandle<()>,
}

impl TestApp {
    /// Serve the storefront router with `config`.
    ///
    /// # Panics
    ///
    /// Panics if the state cannot be built or no local port can be bound.
    pub async fn spawn(config: StorefrontConfig) -> Self {
        let state = AppState::new(config).expect("Failed to build application state");
        let (addr, task) = serve(kebab_storefront::app(state)).await;

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            task,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// HTTP client for ad-hoc requests.
    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// `GET path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET")
    }

    /// `POST path` with a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.task.abort();
    }
}
