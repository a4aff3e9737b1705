//! Prometheus metrics infrastructure for the directions proxy.
//!
//! This module provides:
//! - [`MetricsConfig`]: Configuration for the metrics system
//! - [`init_metrics`]: Initialize the Prometheus metrics recorder
//! - [`metrics_handler`]: Axum handler for the metrics endpoint
//! - Helpers for upstream and validation metrics
//!
//! # Example
//!
//! ```no_run
//! use directions_proxy_service_shared::metrics::{MetricsConfig, init_metrics, metrics_handler};
//! use axum::{Router, routing::get};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config).expect("failed to initialize metrics");
//!
//! let app: Router = Router::new()
//!     .route(&config.path, get(metrics_handler));
//! ```

use std::time::Duration;

use directions_proxy_lib::Endpoint;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Configuration for the metrics system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether the recorder and endpoint are enabled.
    pub enabled: bool,
    /// Path for the metrics endpoint (e.g., "/metrics").
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Create configuration from environment variables.
    ///
    /// - `METRICS_ENABLED`: "true" or "false" (default: true)
    /// - `METRICS_PATH`: Path for metrics endpoint (default: "/metrics")
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("METRICS_ENABLED")
            .map(|v| v.trim().to_lowercase() != "false")
            .unwrap_or(true);

        let path = lookup("METRICS_PATH")
            .map(|p| p.trim().to_string())
            .filter(|p| p.starts_with('/') && p.len() > 1)
            .unwrap_or_else(|| "/metrics".to_string());

        Self { enabled, path }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Initialize the Prometheus metrics recorder.
///
/// Must be called once at startup before any metrics are recorded.
///
/// # Errors
///
/// - Metrics are disabled in configuration
/// - The recorder has already been installed
/// - The Prometheus builder fails to install
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }

    if PROMETHEUS_HANDLE.get().is_some() {
        return Err(MetricsError::AlreadyInitialized);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)
}

/// Axum handler for the metrics endpoint, in Prometheus exposition format.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

/// Errors that can occur during metrics initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Proxy metrics helpers
// =============================================================================

/// Outcome label for an upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamOutcome {
    Success,
    Failure,
}

impl UpstreamOutcome {
    fn as_str(self) -> &'static str {
        match self {
            UpstreamOutcome::Success => "success",
            UpstreamOutcome::Failure => "failure",
        }
    }
}

/// Record one finished upstream call and its latency.
///
/// Feeds `directions_proxy_upstream_requests_total` and
/// `directions_proxy_upstream_duration_seconds`.
pub fn record_upstream_call(endpoint: Endpoint, outcome: UpstreamOutcome, elapsed: Duration) {
    metrics::counter!(
        "directions_proxy_upstream_requests_total",
        "endpoint" => endpoint.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    metrics::histogram!(
        "directions_proxy_upstream_duration_seconds",
        "endpoint" => endpoint.as_str()
    )
    .record(elapsed.as_secs_f64());
}

/// Count the Google `status` field of successful upstream bodies
/// (`OK`, `ZERO_RESULTS`, `REQUEST_DENIED`, ...).
pub fn record_upstream_status(endpoint: Endpoint, status: Option<&str>) {
    metrics::counter!(
        "directions_proxy_upstream_status_total",
        "endpoint" => endpoint.as_str(),
        "status" => normalize_google_status(status)
    )
    .increment(1);
}

/// Count a request rejected before any upstream call.
pub fn record_validation_failure(endpoint: Endpoint, reason: &'static str) {
    metrics::counter!(
        "directions_proxy_validation_failures_total",
        "endpoint" => endpoint.as_str(),
        "reason" => reason
    )
    .increment(1);
}

/// Restrict the Google status label to the documented values so a misbehaving
/// upstream cannot create unbounded label values.
fn normalize_google_status(status: Option<&str>) -> &'static str {
    match status {
        Some("OK") => "OK",
        Some("ZERO_RESULTS") => "ZERO_RESULTS",
        Some("NOT_FOUND") => "NOT_FOUND",
        Some("MAX_WAYPOINTS_EXCEEDED") => "MAX_WAYPOINTS_EXCEEDED",
        Some("MAX_ROUTE_LENGTH_EXCEEDED") => "MAX_ROUTE_LENGTH_EXCEEDED",
        Some("INVALID_REQUEST") => "INVALID_REQUEST",
        Some("OVER_DAILY_LIMIT") => "OVER_DAILY_LIMIT",
        Some("OVER_QUERY_LIMIT") => "OVER_QUERY_LIMIT",
        Some("REQUEST_DENIED") => "REQUEST_DENIED",
        Some("UNKNOWN_ERROR") => "UNKNOWN_ERROR",
        Some(_) => "other",
        None => "absent",
    }
}
