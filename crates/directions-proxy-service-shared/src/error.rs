//! JSON error bodies returned by every endpoint.
//!
//! Every failure leaves the service as `{"error": "...", "details": "..."}`
//! with `details` omitted when there is nothing to add. The HTTP status
//! travels alongside the body and is not serialized into it.

use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use directions_proxy_lib::{Endpoint, Error as LibError};

/// Message for a directions request missing either location.
pub const MSG_DIRECTIONS_REQUIRED: &str = "origin and destination are required";

/// Message for a geocode request missing its coordinates.
pub const MSG_LATLNG_REQUIRED: &str = "latlng is required";

/// Message for an unmatched path or method.
pub const MSG_ROUTE_NOT_FOUND: &str = "Route not found";

/// Message for a query string that could not be decoded.
pub const MSG_INVALID_QUERY: &str = "invalid query string";

/// Error body shared by all endpoints.
///
/// # Example
///
/// ```
/// use directions_proxy_service_shared::ErrorResponse;
///
/// let err = ErrorResponse::bad_request("latlng is required");
/// assert_eq!(err.status, 400);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status; sent as the response status, not in the body.
    #[serde(skip)]
    pub status: u16,

    /// Short, fixed description of the failure class.
    pub error: String,

    /// Occurrence-specific explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// 400 for a missing or malformed parameter.
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// 404 for paths and methods the proxy does not serve.
    pub fn route_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, MSG_ROUTE_NOT_FOUND)
    }

    /// 500 for a failed upstream call on `endpoint`.
    pub fn upstream_failure(endpoint: Endpoint, error: &LibError) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to fetch {}", endpoint),
        )
        .with_details(render_error_chain(error))
    }

    /// 503 when the service cannot take the request at all.
    pub fn service_unavailable(details: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "Service unavailable").with_details(details)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.error, details),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for ErrorResponse {}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

/// Render an error and its sources as `outer: inner: root`.
///
/// Transport errors from the HTTP client keep the useful part of the cause
/// (connection refused, DNS failure) in their source chain, so the top-level
/// message alone is too vague for the `details` field.
pub fn render_error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
