//! GraphQL query envelope.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a request body is not a usable envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The body is not a JSON object.
    #[error("request body must be a JSON object")]
    NotAnObject,

    /// `query` is missing, not a string, or blank.
    #[error("Missing GraphQL query")]
    MissingQuery,
}

/// A `{query, variables?}` document, kept exactly as the client sent it.
///
/// Any other top-level fields (`operationName`, `extensions`, ...) are
/// preserved and forwarded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryEnvelope(Map<String, Value>);

impl QueryEnvelope {
    /// Parse and check a raw request body.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::MissingQuery`] for an empty or non-JSON body
    /// and for a body without a non-blank `query` string, and
    /// [`EnvelopeError::NotAnObject`] for JSON that is not an object.
    pub fn from_slice(body: &[u8]) -> Result<Self, EnvelopeError> {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Self::from_map(map),
            Ok(_) => Err(EnvelopeError::NotAnObject),
            Err(_) => Err(EnvelopeError::MissingQuery),
        }
    }

    /// Check an already-parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::MissingQuery`] when `query` is missing or blank.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, EnvelopeError> {
        match map.get("query") {
            Some(Value::String(query)) if !query.trim().is_empty() => Ok(Self(map)),
            _ => Err(EnvelopeError::MissingQuery),
        }
    }

    /// The query document.
    #[must_use]
    pub fn query(&self) -> &str {
        self.0.get("query").and_then(Value::as_str).unwrap_or_default()
    }

    /// The variables, if any.
    #[must_use]
    pub fn variables(&self) -> Option<&Value> {
        self.0.get("variables")
    }

    /// The operation name, if any.
    #[must_use]
    pub fn operation_name(&self) -> Option<&str> {
        self.0.get("operationName").and_then(Value::as_str)
    }
}
