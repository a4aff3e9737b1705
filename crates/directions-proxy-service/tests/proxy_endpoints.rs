use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use directions_proxy_service::build_router;
use directions_proxy_service_shared::test_utils::{
    test_state, unreachable_base_url, MockReply, MockUpstream, SAMPLE_DIRECTIONS_BODY,
    SAMPLE_GEOCODE_BODY, TEST_API_KEY,
};
use directions_proxy_service_shared::{AppState, MetricsConfig};

const TIMEOUT: Duration = Duration::from_secs(5);

fn server_for(state: AppState) -> TestServer {
    TestServer::new(build_router(state, &MetricsConfig::disabled())).expect("test server starts")
}

async fn server_with_mock(reply: MockReply) -> (TestServer, MockUpstream) {
    let mock = MockUpstream::start(reply).await;
    let server = server_for(test_state(&mock.base_url(), TIMEOUT));
    (server, mock)
}

#[tokio::test]
async fn directions_without_origin_is_rejected_before_upstream() {
    let (server, mock) = server_with_mock(MockReply::json(SAMPLE_DIRECTIONS_BODY)).await;

    let response = server
        .get("/directions")
        .add_query_param("destination", "Boston")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({"error": "origin and destination are required"}));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn directions_without_destination_is_rejected_before_upstream() {
    let (server, mock) = server_with_mock(MockReply::json(SAMPLE_DIRECTIONS_BODY)).await;

    let response = server
        .get("/directions")
        .add_query_param("origin", "New York")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({"error": "origin and destination are required"}));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn blank_origin_counts_as_missing() {
    let (server, mock) = server_with_mock(MockReply::json(SAMPLE_DIRECTIONS_BODY)).await;

    let response = server
        .get("/directions")
        .add_query_param("origin", "  ")
        .add_query_param("destination", "Boston")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn geocode_without_latlng_is_rejected_before_upstream() {
    let (server, mock) = server_with_mock(MockReply::json(SAMPLE_GEOCODE_BODY)).await;

    let response = server.get("/geocode").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({"error": "latlng is required"}));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn whitespace_latlng_counts_as_missing() {
    let (server, mock) = server_with_mock(MockReply::json(SAMPLE_GEOCODE_BODY)).await;

    let response = server.get("/geocode").add_query_param("latlng", " \t").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({"error": "latlng is required"}));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn directions_forwards_encoded_query_with_defaults_and_key() {
    let (server, mock) = server_with_mock(MockReply::json(SAMPLE_DIRECTIONS_BODY)).await;

    let response = server
        .get("/directions")
        .add_query_param("origin", "New York")
        .add_query_param("destination", "Boston")
        .await;

    response.assert_status_ok();
    assert_eq!(mock.call_count(), 1);

    let call = mock.last_call().expect("upstream was called");
    assert_eq!(call.path, "/maps/api/directions/json");
    assert_eq!(
        call.query,
        format!(
            "origin=New%20York&destination=Boston&key={}&mode=driving&overview=full&units=metric",
            TEST_API_KEY
        )
    );
}

#[tokio::test]
async fn directions_forwards_explicit_options() {
    let (server, mock) = server_with_mock(MockReply::json(SAMPLE_DIRECTIONS_BODY)).await;

    let response = server
        .get("/directions")
        .add_query_param("origin", "Paris")
        .add_query_param("destination", "Lyon")
        .add_query_param("mode", "bicycling")
        .add_query_param("overview", "simplified")
        .add_query_param("units", "imperial")
        .await;

    response.assert_status_ok();
    let call = mock.last_call().expect("upstream was called");
    assert!(call.query.contains("mode=bicycling"));
    assert!(call.query.contains("overview=simplified"));
    assert!(call.query.contains("units=imperial"));
}

#[tokio::test]
async fn directions_rejects_unknown_mode() {
    let (server, mock) = server_with_mock(MockReply::json(SAMPLE_DIRECTIONS_BODY)).await;

    let response = server
        .get("/directions")
        .add_query_param("origin", "A")
        .add_query_param("destination", "B")
        .add_query_param("mode", "teleport")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid mode");
    assert!(body["details"].as_str().unwrap().contains("teleport"));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn directions_body_is_relayed_byte_for_byte() {
    let (server, _mock) = server_with_mock(MockReply::json(SAMPLE_DIRECTIONS_BODY)).await;

    let response = server
        .get("/directions")
        .add_query_param("origin", "New York")
        .add_query_param("destination", "Boston")
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), SAMPLE_DIRECTIONS_BODY);
    let content_type = response.header("content-type");
    assert!(content_type.to_str().unwrap().starts_with("application/json"));
}

#[tokio::test]
async fn google_error_status_is_relayed_with_200() {
    let body = r#"{"routes":[],"status":"ZERO_RESULTS"}"#;
    let (server, _mock) = server_with_mock(MockReply::json(body)).await;

    let response = server
        .get("/directions")
        .add_query_param("origin", "Honolulu")
        .add_query_param("destination", "Tokyo")
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), body);
}

#[tokio::test]
async fn geocode_calls_upstream_once_per_request() {
    let (server, mock) = server_with_mock(MockReply::json(SAMPLE_GEOCODE_BODY)).await;

    let first = server
        .get("/geocode")
        .add_query_param("latlng", "40.7128,-74.0060")
        .await;
    let second = server
        .get("/geocode")
        .add_query_param("latlng", "40.7128,-74.0060")
        .await;

    first.assert_status_ok();
    second.assert_status_ok();
    assert_eq!(first.text(), SAMPLE_GEOCODE_BODY);
    assert_eq!(second.text(), SAMPLE_GEOCODE_BODY);
    assert_eq!(mock.call_count(), 2);

    let call = mock.last_call().expect("upstream was called");
    assert_eq!(call.path, "/maps/api/geocode/json");
    assert_eq!(
        call.query,
        format!("latlng=40.7128%2C-74.0060&key={}", TEST_API_KEY)
    );
}

#[tokio::test]
async fn unreachable_upstream_yields_500_and_server_keeps_serving() {
    let server = server_for(test_state(&unreachable_base_url(), TIMEOUT));

    let response = server
        .get("/directions")
        .add_query_param("origin", "A")
        .add_query_param("destination", "B")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to fetch directions");
    assert!(!body["details"].as_str().unwrap().is_empty());

    let geocode = server.get("/geocode").add_query_param("latlng", "1,2").await;
    geocode.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = geocode.json();
    assert_eq!(body["error"], "Failed to fetch geocode");

    server.get("/health/live").await.assert_status_ok();
}

#[tokio::test]
async fn upstream_api_key_never_leaks_into_error_details() {
    let server = server_for(test_state(&unreachable_base_url(), TIMEOUT));

    let response = server.get("/geocode").add_query_param("latlng", "1,2").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text().contains(TEST_API_KEY));
}

#[tokio::test]
async fn non_json_upstream_body_yields_500() {
    let (server, mock) = server_with_mock(MockReply::html("<html>maintenance</html>")).await;

    let response = server.get("/geocode").add_query_param("latlng", "1,2").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to fetch geocode");
    assert!(body["details"].is_string());
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn upstream_http_error_yields_500() {
    let (server, _mock) =
        server_with_mock(MockReply::json("{}").with_status(StatusCode::BAD_GATEWAY)).await;

    let response = server
        .get("/directions")
        .add_query_param("origin", "A")
        .add_query_param("destination", "B")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["details"].as_str().unwrap().contains("502"));
}

#[tokio::test]
async fn slow_upstream_times_out_with_500() {
    let mock = MockUpstream::start(
        MockReply::json(SAMPLE_GEOCODE_BODY).with_delay(Duration::from_secs(3)),
    )
    .await;
    let server = server_for(test_state(&mock.base_url(), Duration::from_millis(200)));

    let response = server.get("/geocode").add_query_param("latlng", "1,2").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["details"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn unknown_routes_and_methods_return_404() {
    let (server, mock) = server_with_mock(MockReply::json("{}")).await;
    let not_found = json!({"error": "Route not found"});

    let response = server.get("/unknown").await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&not_found);

    let response = server.post("/unknown").await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&not_found);

    let response = server
        .post("/directions")
        .add_query_param("origin", "A")
        .add_query_param("destination", "B")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&not_found);

    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() {
    let (server, _mock) = server_with_mock(MockReply::json("{}")).await;

    let response = server
        .get("/health/live")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-abc-123"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "req-abc-123");

    let response = server.get("/unknown").await;
    let generated = response.header("x-request-id");
    assert!(!generated.is_empty());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let (server, _mock) = server_with_mock(MockReply::json(SAMPLE_GEOCODE_BODY)).await;

    let response = server
        .get("/geocode")
        .add_query_param("latlng", "1,2")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://app.example.com"),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("access-control-allow-origin"), "*");
}

#[tokio::test]
async fn index_describes_service_without_calling_upstream() {
    let (server, mock) = server_with_mock(MockReply::json("{}")).await;

    let response = server.get("/").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["service"], "directions-proxy-service");
    assert!(body["endpoints"]["directions"].is_string());
    assert!(body["endpoints"]["geocode"].is_string());
    assert_eq!(
        body["examples"]["directions"],
        "/directions?origin=New%20York&destination=Boston"
    );
    assert_eq!(body["examples"]["geocode"], "/geocode?latlng=40.7128,-74.0060");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn health_endpoints_report_ok() {
    let (server, mock) = server_with_mock(MockReply::json("{}")).await;

    let live = server.get("/health/live").await;
    live.assert_status_ok();
    let body: Value = live.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "directions-proxy");

    let ready = server.get("/health/ready").await;
    ready.assert_status_ok();
    let body: Value = ready.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["upstream"], mock.base_url());

    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn health_reports_configured_service_name() {
    let mock = MockUpstream::start(MockReply::json("{}")).await;
    let state = test_state(&mock.base_url(), TIMEOUT).with_service_info("proxy-eu", "2.3.4");
    let server = server_for(state);

    for path in ["/health/live", "/health/ready"] {
        let response = server.get(path).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["service"], "proxy-eu");
        assert_eq!(body["version"], "2.3.4");
    }
}

#[tokio::test]
async fn cors_preflight_is_answered_before_routing() {
    let (server, mock) = server_with_mock(MockReply::json("{}")).await;

    for path in ["/directions", "/unknown"] {
        let response = server
            .method(Method::OPTIONS, path)
            .add_header(
                HeaderName::from_static("origin"),
                HeaderValue::from_static("https://app.example.com"),
            )
            .add_header(
                HeaderName::from_static("access-control-request-method"),
                HeaderValue::from_static("GET"),
            )
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("access-control-allow-origin"), "*");
        assert!(response.text().is_empty());
    }

    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn metrics_route_follows_configuration() {
    let mock = MockUpstream::start(MockReply::json("{}")).await;
    let state = test_state(&mock.base_url(), TIMEOUT);

    let disabled = server_for(state.clone());
    disabled
        .get("/metrics")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let config = MetricsConfig {
        enabled: true,
        path: "/internal/metrics".to_string(),
    };
    let enabled = TestServer::new(build_router(state, &config)).expect("test server starts");
    enabled.get("/internal/metrics").await.assert_status_ok();
}
