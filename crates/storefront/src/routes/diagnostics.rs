//! Configuration introspection.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// Non-secret view of the content configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigReport {
    /// Explicitly configured GraphQL endpoint, if any.
    pub endpoint: Option<String>,
    /// Whether a CMS token is configured. The token itself is never returned.
    pub has_token: bool,
    /// Deployment environment name.
    pub node_env: Option<String>,
}

/// Report which content settings are in effect.
pub async fn config(State(state): State<AppState>) -> Json<ConfigReport> {
    let config = state.config();
    Json(ConfigReport {
        endpoint: config.content.graphql_endpoint.clone(),
        has_token: config.content.api_token.is_some(),
        node_env: config.environment.clone(),
    })
}
