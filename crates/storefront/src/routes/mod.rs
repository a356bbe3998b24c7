//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (payment provider configured)
//!
//! # API
//! POST /api/create-checkout-session - Start a hosted Stripe checkout
//! POST /api/gql                     - Relay a GraphQL query to the CMS
//! GET  /api/config                  - Non-secret content configuration
//! ```

pub mod checkout;
pub mod diagnostics;
pub mod gateway;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/create-checkout-session",
            post(checkout::create_checkout_session),
        )
        .route("/gql", post(gateway::forward_query))
        .route("/config", get(diagnostics::config))
}

/// Create the main routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}
