//! Shared infrastructure for the directions proxy HTTP service.
//!
//! - [`AppState`]: Upstream client and admission limit shared by handlers
//! - [`health`]: Liveness and readiness handlers
//! - [`ErrorResponse`]: `{error, details}` bodies for every failure
//! - [`JsonPassthrough`]: Byte-for-byte relay of upstream JSON
//! - [`metrics`]: Prometheus metrics infrastructure
//! - [`logging`]: Structured JSON logging setup
//! - [`middleware`]: Request tracking and correlation IDs
//! - [`limit`]: Optional concurrent-request admission limit
//! - Query parameter types with validation for each endpoint
//!
//! # Architecture
//!
//! Handlers stay thin. Upstream access, typed queries, and configuration
//! live in `directions-proxy-lib`; this crate only supplies HTTP glue:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Decode query string                                      │
//! │  - Validate parameters (400 before any upstream call)       │
//! │  - Call MapsClient                                          │
//! │  - Relay body verbatim, or map failure to 500               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides a mock upstream server and state
//! helpers. Enable the `test-utils` feature to access it from dependent crates.

mod error;
pub mod health;
pub mod limit;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod request;
mod response;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{
    render_error_chain, ErrorResponse, MSG_DIRECTIONS_REQUIRED, MSG_INVALID_QUERY,
    MSG_LATLNG_REQUIRED, MSG_ROUTE_NOT_FOUND,
};
pub use health::{health_live, health_ready, HealthStatus};
pub use limit::limit_concurrency;
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_upstream_call, record_upstream_status,
    record_validation_failure, MetricsConfig, MetricsError, UpstreamOutcome,
};
pub use middleware::{extract_or_generate_request_id, RequestId, TrackingLayer};
pub use request::{DirectionsParams, GeocodeParams, Validate};
pub use response::JsonPassthrough;
pub use state::AppState;
