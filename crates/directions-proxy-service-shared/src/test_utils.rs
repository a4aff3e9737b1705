//! Test utilities for proxy handler testing.
//!
//! [`MockUpstream`] is a local HTTP server standing in for the Google Maps
//! API. It records the path and raw query string of every call and answers
//! with a configurable status, body, and delay.

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use directions_proxy_lib::UpstreamConfig;

use crate::state::AppState;

/// API key injected by [`test_state`].
pub const TEST_API_KEY: &str = "test-api-key";

/// Sample Directions API body with deliberately unusual formatting, so any
/// re-serialization by the proxy would show up in byte comparisons.
pub const SAMPLE_DIRECTIONS_BODY: &str = r#"{"status":"OK",  "routes":[{"summary":"I-95 N","legs":[{"distance":{"text":"346 km","value":346000}}]}],"geocoded_waypoints":[]}"#;

/// Sample Geocoding API body.
pub const SAMPLE_GEOCODE_BODY: &str = r#"{"results":[{"formatted_address":"New York, NY, USA","place_id":"ChIJOwg_06VPwokRYv534QaPC8g"}],"status":"OK"}"#;

/// A call received by the mock upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub path: String,
    /// Raw, still percent-encoded query string.
    pub query: String,
}

/// Reply the mock upstream sends for every call.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    /// 200 with a JSON body.
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "application/json; charset=UTF-8",
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// 200 with a non-JSON body.
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            content_type: "text/html",
            ..Self::json(body)
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

struct MockState {
    reply: Mutex<MockReply>,
    calls: Mutex<Vec<RecordedCall>>,
}

/// Local stand-in for the Google Maps API.
///
/// The server task is aborted when the value is dropped.
pub struct MockUpstream {
    addr: SocketAddr,
    state: Arc<MockState>,
    task: JoinHandle<()>,
}

impl MockUpstream {
    /// Start a mock on an ephemeral localhost port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind; this indicates a broken test host.
    pub async fn start(reply: MockReply) -> Self {
        let state = Arc::new(MockState {
            reply: Mutex::new(reply),
            calls: Mutex::new(Vec::new()),
        });

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("failed to bind mock upstream: {}", e));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("mock upstream has no local address: {}", e));

        let app: Router = Router::new()
            .fallback(record_and_reply)
            .with_state(state.clone());

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "mock upstream stopped");
            }
        });

        Self { addr, state, task }
    }

    /// Base URL to put in [`UpstreamConfig::base_url`].
    pub fn base_url(&self) -> String {
        format!("http://{}/maps/api", self.addr)
    }

    /// Replace the reply for subsequent calls.
    pub fn set_reply(&self, reply: MockReply) {
        *lock(&self.state.reply) = reply;
    }

    pub fn call_count(&self) -> usize {
        lock(&self.state.calls).len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state.calls).clone()
    }

    /// The most recent call, if any.
    pub fn last_call(&self) -> Option<RecordedCall> {
        lock(&self.state.calls).last().cloned()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn record_and_reply(State(state): State<Arc<MockState>>, uri: Uri) -> Response {
    lock(&state.calls).push(RecordedCall {
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
    });

    let reply = lock(&state.reply).clone();
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    (
        reply.status,
        [(header::CONTENT_TYPE, reply.content_type)],
        reply.body,
    )
        .into_response()
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Base URL of a localhost port with nothing listening, for connection
/// failure tests.
pub fn unreachable_base_url() -> String {
    let listener = StdTcpListener::bind("127.0.0.1:0")
        .unwrap_or_else(|e| panic!("failed to reserve a port: {}", e));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("reserved port has no address: {}", e));
    drop(listener);
    format!("http://{}/maps/api", addr)
}

/// State pointing at `base_url` with [`TEST_API_KEY`] and the given timeout.
pub fn test_state(base_url: &str, timeout: Duration) -> AppState {
    let upstream = UpstreamConfig::new(TEST_API_KEY)
        .with_base_url(base_url)
        .with_timeout(timeout);
    AppState::from_upstream(upstream)
        .unwrap_or_else(|e| panic!("failed to build test state: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let mock = MockUpstream::start(MockReply::json(SAMPLE_GEOCODE_BODY)).await;
        let state = test_state(&mock.base_url(), Duration::from_secs(2));

        let payload = state
            .client()
            .geocode(&directions_proxy_lib::GeocodeQuery::new("1,2"))
            .await
            .unwrap();

        assert_eq!(payload.body, SAMPLE_GEOCODE_BODY.as_bytes());
        assert_eq!(mock.call_count(), 1);

        let call = mock.last_call().unwrap();
        assert_eq!(call.path, "/maps/api/geocode/json");
        assert_eq!(call.query, format!("latlng=1%2C2&key={}", TEST_API_KEY));
    }

    #[tokio::test]
    async fn test_mock_reply_can_change() {
        let mock = MockUpstream::start(MockReply::json("{}")).await;
        mock.set_reply(MockReply::json("[]").with_status(StatusCode::BAD_GATEWAY));
        let state = test_state(&mock.base_url(), Duration::from_secs(2));

        let err = state
            .client()
            .geocode(&directions_proxy_lib::GeocodeQuery::new("1,2"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            directions_proxy_lib::Error::UpstreamStatus { status: 502 }
        ));
    }

    #[test]
    fn test_unreachable_base_url_format() {
        let url = unreachable_base_url();
        assert!(url.starts_with("http://127.0.0.1:"));
        assert!(url.ends_with("/maps/api"));
    }
}
