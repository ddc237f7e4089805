//! HTTP server exposing the registry to Prometheus.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::{Error, Result};
use crate::metrics::{MetricsRegistry, TEXT_FORMAT};

/// Metrics endpoint configuration.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 9000,
        }
    }
}

impl MetricsServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().map_err(|e| {
            Error::config(format!("Invalid bind address {}: {}", self.bind_address, e))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Build the router serving the exposition on `/` and `/metrics`.
pub fn router(registry: Arc<MetricsRegistry>) -> Router {
    Router::new()
        .route("/", get(metrics))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

async fn metrics(State(registry): State<Arc<MetricsRegistry>>) -> Response {
    match registry.render().await {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            warn!(error = %e, "Scrape failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("failed to collect OBS metrics: {e}\n"),
            )
                .into_response()
        }
    }
}

/// Metrics HTTP server.
pub struct MetricsServer {
    config: MetricsServerConfig,
    registry: Arc<MetricsRegistry>,
    cancel_token: CancellationToken,
}

impl MetricsServer {
    pub fn new(config: MetricsServerConfig, registry: Arc<MetricsRegistry>) -> Self {
        Self {
            config,
            registry,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Bind the listening socket. Fails before anything is served.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.socket_addr()?;
        Ok(TcpListener::bind(addr).await?)
    }

    /// Serve scrapes until the cancellation token fires.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router(self.registry.clone()))
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("Metrics server shutting down...");
            })
            .await?;

        Ok(())
    }
}
