//! Supervisor loop owning the OBS session lifecycle.
//!
//! ```text
//! NoSession -> Connecting -> Live -> Disconnected -> Connecting -> ...
//! ```
//!
//! The registry always reflects the state: the placeholder producer
//! (`obsConnection 0`) outside `Live`, the live producer inside it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::Error;
use crate::metrics::MetricsRegistry;
use crate::upstream::{Connector, ObsApi, connect_with_retry};

/// Configuration for the supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Delay between failed connection attempts.
    pub retry_delay: Duration,
    /// Interval between liveness checks while live.
    pub check_interval: Duration,
    /// Pause after losing the session before reconnecting.
    pub reconnect_delay: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(3),
            check_interval: Duration::from_secs(5),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    NoSession,
    Connecting,
    Live,
    Disconnected,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoSession => "no_session",
            Self::Connecting => "connecting",
            Self::Live => "live",
            Self::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

pub struct Supervisor {
    connector: Arc<dyn Connector>,
    registry: Arc<MetricsRegistry>,
    config: SupervisorConfig,
    cancel_token: CancellationToken,
    state_tx: watch::Sender<SupervisorState>,
}

impl Supervisor {
    pub fn new(
        connector: Arc<dyn Connector>,
        registry: Arc<MetricsRegistry>,
        config: SupervisorConfig,
        cancel_token: CancellationToken,
    ) -> Self {
        let (state_tx, _) = watch::channel(SupervisorState::NoSession);
        Self {
            connector,
            registry,
            config,
            cancel_token,
            state_tx,
        }
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> SupervisorState {
        *self.state_tx.borrow()
    }

    /// Drive the lifecycle until the cancellation token fires.
    pub async fn run(self) {
        info!(endpoint = %self.connector.endpoint(), "Supervisor started");

        self.registry.register_placeholder();
        self.transition(SupervisorState::NoSession);

        while !self.cancel_token.is_cancelled() {
            self.transition(SupervisorState::Connecting);

            let Some(session) = connect_with_retry(
                self.connector.as_ref(),
                self.config.retry_delay,
                &self.cancel_token,
            )
            .await
            else {
                break;
            };

            self.registry.register_live(session.clone());
            self.transition(SupervisorState::Live);

            match session.get_version().await {
                Ok(version) => info!(
                    obs_version = %version.obs_version,
                    websocket_version = %version.obs_web_socket_version,
                    "OBS Version: {}",
                    version.obs_version
                ),
                Err(e) => warn!(error = %e, "Failed to query OBS version"),
            }

            let lost = self.watch_session(session.as_ref()).await;

            // Stop exposing the session before tearing it down.
            self.registry.register_placeholder();
            session.close().await;

            let Some(e) = lost else {
                break;
            };

            error!(error = %e, "Lost connection to OBS");
            self.transition(SupervisorState::Disconnected);

            tokio::select! {
                _ = self.cancel_token.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }

        self.registry.clear();
        info!("Supervisor stopped");
    }

    /// Check liveness every interval. Returns the failure, or `None` on cancel.
    async fn watch_session(&self, session: &dyn ObsApi) -> Option<Error> {
        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => return None,
                _ = tokio::time::sleep(self.config.check_interval) => {}
            }

            match session.check_alive().await {
                Ok(()) => trace!("OBS session alive"),
                Err(e) => return Some(e),
            }
        }
    }

    fn transition(&self, next: SupervisorState) {
        let previous = self.state_tx.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "Supervisor state changed");
        }
    }
}
