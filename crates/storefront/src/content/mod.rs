//! Headless CMS query proxy client.
//!
//! The browser never sees the CMS token. It posts a GraphQL envelope to the
//! storefront, which forwards it here with the token attached and relays the
//! CMS response untouched. The proxy does not interpret the query language:
//! whatever the CMS answers with a 2xx JSON body goes back to the browser,
//! including GraphQL-level `errors`.

mod client;
mod envelope;

pub use client::ContentClient;
pub use envelope::{EnvelopeError, QueryEnvelope};

use thiserror::Error;

/// Errors that can occur when relaying a query to the CMS.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The call exceeded the outbound timeout.
    #[error("CMS request timed out")]
    Timeout,

    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The CMS answered with a non-success status.
    #[error("CMS returned HTTP {0}")]
    Status(u16),

    /// The CMS answered 2xx with a body that is not JSON.
    #[error("Malformed CMS response: {0}")]
    Malformed(String),
}

impl ContentError {
    /// Message safe to return to the browser.
    ///
    /// Never includes transport error text, which can carry internal hostnames.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Timeout => "Content backend timed out".to_string(),
            Self::Http(_) => "Content backend unreachable".to_string(),
            Self::Status(status) => format!("Content backend returned HTTP {status}"),
            Self::Malformed(_) => "Content backend returned a malformed response".to_string(),
        }
    }
}

impl From<reqwest::Error> for ContentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}
