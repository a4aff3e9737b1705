//! Passthrough response for upstream JSON bodies.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use directions_proxy_lib::UpstreamPayload;

/// Relays an upstream JSON body byte-for-byte with status 200.
///
/// The body is never parsed back into a value and re-serialized, so key
/// order, whitespace, and number formatting are exactly what the upstream
/// produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPassthrough {
    body: Vec<u8>,
}

impl JsonPassthrough {
    pub fn new(body: Vec<u8>) -> Self {
        Self { body }
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl From<UpstreamPayload> for JsonPassthrough {
    fn from(payload: UpstreamPayload) -> Self {
        Self::new(payload.body)
    }
}

impl IntoResponse for JsonPassthrough {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            )],
            self.body,
        )
            .into_response()
    }
}
