//! Outbound client for the Google Maps Platform REST API.

use std::fmt;
use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use crate::query::{DirectionsQuery, GeocodeQuery};

/// Upstream endpoints the proxy forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Directions,
    Geocode,
}

impl Endpoint {
    /// Short label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Directions => "directions",
            Endpoint::Geocode => "geocode",
        }
    }

    fn path(self) -> &'static str {
        match self {
            Endpoint::Directions => "directions/json",
            Endpoint::Geocode => "geocode/json",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful upstream answer.
///
/// `body` is exactly what the upstream sent and has been checked to parse as
/// JSON. `status` is Google's own `status` field when the body carries one;
/// it is informational and never changes how the body is relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamPayload {
    pub body: Vec<u8>,
    pub status: Option<String>,
}

impl UpstreamPayload {
    /// Validate `body` as JSON and pick out the Google status field.
    pub fn from_body(body: Vec<u8>) -> Result<Self> {
        let value: Value = serde_json::from_slice(&body)?;
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Self { body, status })
    }
}

/// Async client for the Directions and Geocoding APIs.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct MapsClient {
    http: Client,
    config: UpstreamConfig,
}

impl MapsClient {
    /// Build a client with the configured timeout.
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("directions-proxy/", env!("CARGO_PKG_VERSION"))),
        );

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(Error::ClientBuild)?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Full upstream URL for a directions lookup, API key included.
    pub fn directions_url(&self, query: &DirectionsQuery) -> String {
        self.endpoint_url(
            Endpoint::Directions,
            &query.to_query_string(&self.config.api_key),
        )
    }

    /// Full upstream URL for a reverse-geocoding lookup, API key included.
    pub fn geocode_url(&self, query: &GeocodeQuery) -> String {
        self.endpoint_url(
            Endpoint::Geocode,
            &query.to_query_string(&self.config.api_key),
        )
    }

    /// Issue one upstream directions request.
    pub async fn directions(&self, query: &DirectionsQuery) -> Result<UpstreamPayload> {
        self.fetch(Endpoint::Directions, self.directions_url(query))
            .await
    }

    /// Issue one upstream geocode request.
    pub async fn geocode(&self, query: &GeocodeQuery) -> Result<UpstreamPayload> {
        self.fetch(Endpoint::Geocode, self.geocode_url(query)).await
    }

    fn endpoint_url(&self, endpoint: Endpoint, query_string: &str) -> String {
        format!("{}/{}?{}", self.config.base_url, endpoint.path(), query_string)
    }

    async fn fetch(&self, endpoint: Endpoint, url: String) -> Result<UpstreamPayload> {
        let started = Instant::now();

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%endpoint, status = status.as_u16(), "upstream returned error status");
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        let payload = UpstreamPayload::from_body(body.to_vec())?;

        debug!(
            %endpoint,
            bytes = payload.body.len(),
            google_status = payload.status.as_deref().unwrap_or("-"),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream call completed"
        );

        Ok(payload)
    }

    /// Map a reqwest failure onto the library error, dropping the URL so the
    /// API key cannot leak through error messages.
    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::UpstreamTimeout(self.config.timeout)
        } else {
            Error::UpstreamTransport(err.without_url())
        }
    }
}

impl fmt::Debug for MapsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapsClient")
            .field("config", &self.config)
            .finish()
    }
}
