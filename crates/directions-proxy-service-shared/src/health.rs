//! Health check handlers for liveness and readiness checks.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health status response for liveness and readiness checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status indicator: "ok".
    pub status: String,

    pub service: String,

    /// Service version from build-time.
    pub version: String,

    /// Upstream base URL (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,

    /// Configured admission limit (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_requests: Option<usize>,
}

impl HealthStatus {
    /// Create a healthy liveness status.
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            upstream: None,
            max_concurrent_requests: None,
        }
    }

    /// Create a ready status describing the upstream.
    pub fn ready(
        service: &str,
        version: &str,
        upstream: &str,
        max_concurrent_requests: Option<usize>,
    ) -> Self {
        Self {
            upstream: Some(upstream.to_string()),
            max_concurrent_requests,
            ..Self::alive(service, version)
        }
    }
}

/// Liveness check handler.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"directions-proxy","version":"0.1.0"}
/// ```
pub async fn health_live(State(state): State<AppState>) -> impl IntoResponse {
    let status = HealthStatus::alive(state.service(), state.version());
    (StatusCode::OK, Json(status))
}

/// Readiness check handler.
///
/// The proxy holds no data that has to load, so readiness only reports the
/// configured upstream. It never calls the upstream; a health check must not spend
/// API quota.
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let status = HealthStatus::ready(
        state.service(),
        state.version(),
        state.client().base_url(),
        state.max_concurrent_requests(),
    );
    (StatusCode::OK, Json(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_alive() {
        let status = HealthStatus::alive("test-service", "1.0.0");
        assert_eq!(status.status, "ok");
        assert_eq!(status.service, "test-service");
        assert_eq!(status.version, "1.0.0");
        assert!(status.upstream.is_none());
    }

    #[test]
    fn test_health_status_ready() {
        let status = HealthStatus::ready("svc", "1.0.0", "https://maps.example", Some(8));
        assert_eq!(status.status, "ok");
        assert_eq!(status.upstream.as_deref(), Some("https://maps.example"));
        assert_eq!(status.max_concurrent_requests, Some(8));
    }

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus::alive("proxy", "0.1.0");
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"service\":\"proxy\""));
        assert!(!json.contains("upstream"));
    }
}
