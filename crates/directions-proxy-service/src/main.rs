//! Directions proxy HTTP server.
//!
//! # Configuration
//!
//! - `GOOGLE_MAPS_API_KEY` - Google Maps API key (required, or `GOOGLE_MAPS_API_KEY_FILE`)
//! - `PORT` - HTTP port (default: 3000)
//! - `BIND_ADDRESS` - Listen address (default: 0.0.0.0)
//! - `UPSTREAM_BASE_URL` - Google Maps API base URL
//! - `UPSTREAM_TIMEOUT_MS` - Upstream request timeout (default: 10000)
//! - `MAX_CONCURRENT_REQUESTS` - Admission limit (default: unlimited)
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text
//! - `METRICS_ENABLED` / `METRICS_PATH` - Prometheus endpoint

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use directions_proxy_lib::ProxyConfig;
use directions_proxy_service::build_router;
use directions_proxy_service_shared::{
    init_logging, init_metrics, AppState, LoggingConfig, MetricsConfig, MetricsError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env();
    match init_metrics(&metrics_config) {
        Ok(()) => info!(path = %metrics_config.path, "metrics initialized"),
        Err(MetricsError::Disabled) => info!("metrics disabled"),
        Err(e) => warn!(error = %e, "failed to initialize metrics, continuing without metrics"),
    }

    let config = ProxyConfig::from_env()
        .inspect_err(|e| error!(error = %e, "invalid configuration"))
        .context("failed to load configuration")?;

    let state = AppState::from_config(&config)
        .inspect_err(|e| error!(error = %e, "failed to build upstream client"))
        .context("failed to build upstream client")?
        .with_service_info(&logging_config.service, env!("CARGO_PKG_VERSION"));

    info!(
        upstream = %config.upstream.base_url,
        timeout_ms = config.upstream.timeout.as_millis() as u64,
        max_concurrent_requests = ?config.max_concurrent_requests,
        metrics = metrics_config.enabled,
        "starting directions proxy"
    );

    let app = build_router(state, &metrics_config);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .inspect_err(|e| error!(error = %e, addr = %addr, "failed to bind listener"))
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(addr = %addr, "Directions proxy server running on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining connections");
}
