use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use obs_exporter::config::{Args, ExporterConfig};
use obs_exporter::logging;
use obs_exporter::metrics::MetricsRegistry;
use obs_exporter::server::MetricsServer;
use obs_exporter::supervisor::Supervisor;
use obs_exporter::upstream::WebSocketConnector;

/// Upper bound on waiting for the server and supervisor to wind down.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args = Args::parse();
    let config = ExporterConfig::from_args(args).context("Invalid configuration")?;

    let registry = Arc::new(MetricsRegistry::new());
    registry.register_placeholder();

    let server = MetricsServer::new(config.server.clone(), registry.clone());
    let server_cancel = server.cancel_token();
    let listener = server
        .bind()
        .await
        .context("Failed to bind the metrics endpoint")?;
    info!("Prometheus exporter running at {}", listener.local_addr()?);

    let mut server_task = tokio::spawn(async move { server.serve(listener).await });

    let supervisor_cancel = CancellationToken::new();
    let supervisor = Supervisor::new(
        Arc::new(WebSocketConnector::new(config.upstream.clone())),
        registry.clone(),
        config.supervisor.clone(),
        supervisor_cancel.clone(),
    );
    let supervisor_task = tokio::spawn(supervisor.run());

    tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutting down OBS Exporter gracefully...");
        }
        result = &mut server_task => {
            // The server never stops on its own; treat it as fatal.
            supervisor_cancel.cancel();
            let _ = supervisor_task.await;
            return match result {
                Ok(Ok(())) => Err(anyhow::anyhow!("Metrics server stopped unexpectedly")),
                Ok(Err(e)) => Err(e).context("Metrics server failed"),
                Err(e) => Err(e).context("Metrics server task panicked"),
            };
        }
    }

    supervisor_cancel.cancel();
    server_cancel.cancel();

    let shutdown = async {
        if let Err(e) = supervisor_task.await {
            error!(error = %e, "Supervisor task failed");
        }
        match server_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Metrics server failed"),
            Err(e) => error!(error = %e, "Metrics server task failed"),
        }
    };

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, shutdown).await.is_err() {
        warn!(timeout = ?SHUTDOWN_TIMEOUT, "Shutdown timed out");
    }

    info!("OBS Exporter stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
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
}
