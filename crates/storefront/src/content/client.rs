//! CMS GraphQL client implementation.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use secrecy::{ExposeSecret, SecretString};
use serde::de::IgnoredAny;
use tracing::{debug, instrument, warn};

use super::{ContentError, QueryEnvelope};
use crate::config::ContentConfig;

/// Client that forwards GraphQL envelopes to the CMS.
///
/// Stateless apart from the pooled HTTP connection; clones share the pool.
#[derive(Clone)]
pub struct ContentClient {
    inner: Arc<ContentClientInner>,
}

struct ContentClientInner {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<SecretString>,
}

impl ContentClient {
    /// Create a new CMS client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ContentConfig, timeout: Duration) -> Result<Self, ContentError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(ContentClientInner {
                client,
                endpoint: config.endpoint(),
                api_token: config.api_token.clone(),
            }),
        })
    }

    /// The endpoint queries are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Forward `envelope` and return the CMS response body unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS cannot be reached, times out, answers with
    /// a non-success status, or answers with a body that is not JSON.
    #[instrument(skip(self, envelope), fields(operation = envelope.operation_name().unwrap_or("anonymous")))]
    pub async fn forward(&self, envelope: &QueryEnvelope) -> Result<Bytes, ContentError> {
        let mut request = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("Content-Type", "application/json")
            .json(envelope);

        if let Some(token) = &self.inner.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!(
                status = %status,
                body = %String::from_utf8_lossy(&body).chars().take(500).collect::<String>(),
                "CMS returned non-success status"
            );
            return Err(ContentError::Status(status.as_u16()));
        }

        if let Err(e) = serde_json::from_slice::<IgnoredAny>(&body) {
            warn!(
                error = %e,
                body = %String::from_utf8_lossy(&body).chars().take(500).collect::<String>(),
                "Failed to parse CMS response"
            );
            return Err(ContentError::Malformed(e.to_string()));
        }

        debug!(bytes = body.len(), "CMS response relayed");
        Ok(body)
    }
}

impl std::fmt::Debug for ContentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentClient")
            .field("endpoint", &self.inner.endpoint)
            .field("has_token", &self.inner.api_token.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_token() {
        let config = ContentConfig {
            graphql_endpoint: Some("https://cms.kebab.test/graphql".to_string()),
            base_url: "http://localhost:1337".to_string(),
            api_token: Some(SecretString::from("f00dcafe-token-9QzX")),
        };
        let client = ContentClient::new(&config, Duration::from_secs(1)).unwrap();

        let debug_output = format!("{client:?}");
        assert!(debug_output.contains("https://cms.kebab.test/graphql"));
        assert!(debug_output.contains("has_token: true"));
        assert!(!debug_output.contains("f00dcafe"));
    }
}
