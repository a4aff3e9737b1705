//! Application state for the proxy handlers.
//!
//! Holds the upstream client built from [`ProxyConfig`] and the optional
//! admission semaphore. Handlers receive it through axum's `State` extractor.

use std::sync::Arc;

use tokio::sync::Semaphore;

use directions_proxy_lib::{MapsClient, ProxyConfig, Result as LibResult, UpstreamConfig};

use crate::logging::DEFAULT_SERVICE_NAME;

/// Shared application state for all axum handlers.
///
/// This struct is cheaply cloneable (using `Arc` internally).
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::get, extract::State};
/// use directions_proxy_service_shared::AppState;
///
/// async fn handler(State(state): State<AppState>) {
///     let client = state.client();
///     // ... issue an upstream call
/// }
///
/// let config = directions_proxy_lib::ProxyConfig::from_env()?;
/// let state = AppState::from_config(&config)?;
/// let app = Router::new()
///     .route("/directions", get(handler))
///     .with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    service: Arc<str>,
    version: &'static str,
}

struct AppStateInner {
    client: MapsClient,
    admission: Option<Arc<Semaphore>>,
    max_concurrent_requests: Option<usize>,
}

impl AppState {
    /// Build state from the full proxy configuration.
    pub fn from_config(config: &ProxyConfig) -> LibResult<Self> {
        let client = MapsClient::new(config.upstream.clone())?;
        Ok(Self::from_components(client, config.max_concurrent_requests))
    }

    /// Build state for an upstream with no admission limit.
    pub fn from_upstream(upstream: UpstreamConfig) -> LibResult<Self> {
        Ok(Self::from_components(MapsClient::new(upstream)?, None))
    }

    /// Create state from a pre-built client.
    pub fn from_components(client: MapsClient, max_concurrent_requests: Option<usize>) -> Self {
        let max_concurrent_requests = max_concurrent_requests.filter(|n| *n > 0);
        Self {
            inner: Arc::new(AppStateInner {
                client,
                admission: max_concurrent_requests.map(|n| Arc::new(Semaphore::new(n))),
                max_concurrent_requests,
            }),
            service: Arc::from(DEFAULT_SERVICE_NAME),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Name and version reported by the health endpoints.
    pub fn with_service_info(mut self, service: &str, version: &'static str) -> Self {
        self.service = Arc::from(service);
        self.version = version;
        self
    }

    /// Access the upstream client.
    pub fn client(&self) -> &MapsClient {
        &self.inner.client
    }

    /// Semaphore bounding concurrent requests, if configured.
    pub fn admission(&self) -> Option<&Arc<Semaphore>> {
        self.inner.admission.as_ref()
    }

    pub fn max_concurrent_requests(&self) -> Option<usize> {
        self.inner.max_concurrent_requests
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn version(&self) -> &'static str {
        self.version
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .field("upstream", &self.inner.client.base_url())
            .field("max_concurrent_requests", &self.inner.max_concurrent_requests)
            .finish()
    }
}
