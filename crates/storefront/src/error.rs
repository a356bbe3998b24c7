//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Two body shapes are produced, matching what each endpoint's callers parse:
//! - checkout errors: `{"message": "..."}`
//! - query proxy errors: `{"errors": [{"message": "..."}]}` (GraphQL style)

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::content::ContentError;
use crate::stripe::StripeError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Checkout request failed validation.
    #[error("Invalid checkout request: {0}")]
    InvalidCheckout(String),

    /// Stripe operation failed.
    #[error("Stripe error: {0}")]
    Stripe(#[from] StripeError),

    /// Query envelope failed validation.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Content backend relay failed.
    #[error("Content backend error: {0}")]
    Content(#[from] ContentError),

}

/// `{"message": "..."}` body.
#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// `{"errors": [{"message": "..."}]}` body.
#[derive(Debug, Serialize)]
pub struct GraphQlErrors {
    pub errors: Vec<ErrorMessage>,
}

impl GraphQlErrors {
    fn single(message: String) -> Self {
        Self {
            errors: vec![ErrorMessage { message }],
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCheckout(_) | Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::Stripe(_) | Self::Content(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        let status = self.status();

        // Don't expose internal error details to clients
        match self {
            Self::InvalidCheckout(message) => (status, Json(ErrorMessage { message })).into_response(),
            Self::Stripe(err) => (
                status,
                Json(ErrorMessage {
                    message: err.public_message(),
                }),
            )
                .into_response(),
            Self::InvalidQuery(message) => {
                (status, Json(GraphQlErrors::single(message))).into_response()
            }
            Self::Content(err) => {
                (status, Json(GraphQlErrors::single(err.public_message()))).into_response()
            }
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for checkout and content activity.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
