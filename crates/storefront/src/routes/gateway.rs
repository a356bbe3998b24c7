//! GraphQL query gateway.
//!
//! The browser posts `{query, variables}` here instead of talking to the CMS
//! directly, so the CMS token stays on the server.

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::content::QueryEnvelope;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Relay a GraphQL envelope to the CMS and return its body unchanged.
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn forward_query(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let envelope =
        QueryEnvelope::from_slice(&body).map_err(|e| AppError::InvalidQuery(e.to_string()))?;

    let relayed = state.content().forward(&envelope).await?;

    Ok(([(header::CONTENT_TYPE, "application/json")], relayed).into_response())
}
