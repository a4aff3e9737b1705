//! Google Maps directions and geocoding relay.
//!
//! Clients call this service instead of Google so the API key never leaves
//! the server. Each endpoint validates its query string, forwards it to the
//! matching Google endpoint with the key attached, and relays the JSON body
//! unchanged.
//!
//! # Endpoints
//!
//! - `GET /` - Service descriptor
//! - `GET /directions?origin=..&destination=..[&mode=..][&overview=..][&units=..]`
//! - `GET /geocode?latlng=..`
//! - `GET /health/live` - Liveness check
//! - `GET /health/ready` - Readiness check
//! - `GET /metrics` - Prometheus metrics (path configurable, can be disabled)
//!
//! Anything else answers `404 {"error":"Route not found"}`.

use std::time::Instant;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderName,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

use directions_proxy_lib::{Endpoint, Result as LibResult, UpstreamPayload};
use directions_proxy_service_shared::{
    health_live, health_ready, limit_concurrency, metrics_handler, middleware::REQUEST_ID_HEADER,
    record_upstream_call, record_upstream_status, record_validation_failure, AppState,
    DirectionsParams, ErrorResponse, GeocodeParams, JsonPassthrough, MetricsConfig, RequestId,
    TrackingLayer, UpstreamOutcome, Validate, MSG_INVALID_QUERY,
};

/// Build the application router.
///
/// Layers, from outermost: request tracking (request id, span, metrics),
/// then CORS. The optional admission limit wraps only the two proxied
/// routes, so health checks and metrics never wait behind upstream calls.
pub fn build_router(state: AppState, metrics: &MetricsConfig) -> Router {
    let proxied = Router::new()
        .route("/directions", get(directions_handler))
        .route("/geocode", get(geocode_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            limit_concurrency,
        ));

    let mut router = Router::new()
        .route("/", get(index_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .merge(proxied);

    if metrics.enabled {
        router = router.route(&metrics.path, get(metrics_handler));
    }

    router
        .fallback(not_found_handler)
        .method_not_allowed_fallback(not_found_handler)
        .layer(cors_layer())
        .layer(TrackingLayer)
        .with_state(state)
}

/// Permissive CORS: any origin, method, and header.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

/// Handle `GET /`.
async fn index_handler() -> impl IntoResponse {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "directions": "/directions?origin={origin}&destination={destination}",
            "geocode": "/geocode?latlng={lat},{lng}",
        },
        "examples": {
            "directions": "/directions?origin=New%20York&destination=Boston",
            "geocode": "/geocode?latlng=40.7128,-74.0060",
        },
    }))
}

/// Handle `GET /directions`.
async fn directions_handler(
    State(state): State<AppState>,
    request_id: RequestId,
    params: Result<Query<DirectionsParams>, QueryRejection>,
) -> Result<JsonPassthrough, ErrorResponse> {
    let endpoint = Endpoint::Directions;
    let Query(params) = params.map_err(|rejection| reject_query(endpoint, &request_id, rejection))?;

    let query = params.validate().map_err(|problem| {
        record_validation_failure(endpoint, params.failure_reason());
        warn!(request_id = %request_id, error = %problem, "rejected directions request");
        *problem
    })?;

    debug!(
        request_id = %request_id,
        origin = %query.origin,
        destination = %query.destination,
        mode = %query.mode,
        overview = %query.overview,
        units = %query.units,
        "forwarding directions request"
    );

    let started = Instant::now();
    let result = state.client().directions(&query).await;
    relay(endpoint, &request_id, started, result)
}

/// Handle `GET /geocode`.
async fn geocode_handler(
    State(state): State<AppState>,
    request_id: RequestId,
    params: Result<Query<GeocodeParams>, QueryRejection>,
) -> Result<JsonPassthrough, ErrorResponse> {
    let endpoint = Endpoint::Geocode;
    let Query(params) = params.map_err(|rejection| reject_query(endpoint, &request_id, rejection))?;

    let query = params.validate().map_err(|problem| {
        record_validation_failure(endpoint, "missing_latlng");
        warn!(request_id = %request_id, error = %problem, "rejected geocode request");
        *problem
    })?;

    debug!(request_id = %request_id, latlng = %query.latlng, "forwarding geocode request");

    let started = Instant::now();
    let result = state.client().geocode(&query).await;
    relay(endpoint, &request_id, started, result)
}

/// Turn an upstream result into the client response, recording metrics.
fn relay(
    endpoint: Endpoint,
    request_id: &RequestId,
    started: Instant,
    result: LibResult<UpstreamPayload>,
) -> Result<JsonPassthrough, ErrorResponse> {
    let elapsed = started.elapsed();

    match result {
        Ok(payload) => {
            record_upstream_call(endpoint, UpstreamOutcome::Success, elapsed);
            record_upstream_status(endpoint, payload.status.as_deref());
            info!(
                request_id = %request_id,
                endpoint = %endpoint,
                google_status = payload.status.as_deref().unwrap_or("none"),
                bytes = payload.body.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "upstream call succeeded"
            );
            Ok(JsonPassthrough::from(payload))
        }
        Err(e) => {
            record_upstream_call(endpoint, UpstreamOutcome::Failure, elapsed);
            error!(
                request_id = %request_id,
                endpoint = %endpoint,
                error = %e,
                elapsed_ms = elapsed.as_millis() as u64,
                "upstream call failed"
            );
            Err(ErrorResponse::upstream_failure(endpoint, &e))
        }
    }
}

fn reject_query(
    endpoint: Endpoint,
    request_id: &RequestId,
    rejection: QueryRejection,
) -> ErrorResponse {
    record_validation_failure(endpoint, "malformed_query");
    let details = rejection.body_text();
    warn!(request_id = %request_id, endpoint = %endpoint, details = %details, "malformed query string");
    ErrorResponse::bad_request(MSG_INVALID_QUERY).with_details(details)
}

async fn not_found_handler() -> ErrorResponse {
    ErrorResponse::route_not_found()
}
