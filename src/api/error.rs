//! Error types for remote service calls.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the Storynest service.
///
/// Validation failures are reported by the service itself and surface as
/// [`ApiError::Service`] with a 4xx status, so there is no separate
/// client-side validation variant.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed: connection refused, DNS failure,
    /// timeout, or a dropped connection mid-response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status. `message` is the
    /// service's own description when the error body could be parsed,
    /// otherwise the raw body text.
    #[error("service error ({status}): {message}")]
    Service { status: StatusCode, message: String },

    /// The service answered with a success status but a body that does
    /// not match the expected schema.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// The HTTP status of the failure, when one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Network(err) => err.status(),
            ApiError::Service { status, .. } => Some(*status),
            ApiError::Decode(_) => None,
        }
    }

    /// True if the failure indicates a rejected or expired credential.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }
}
