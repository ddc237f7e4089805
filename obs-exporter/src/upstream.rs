//! Upstream session: the OBS connection seen by the rest of the exporter.
//!
//! [`ObsApi`] is the set of queries one collection cycle needs, [`Connector`]
//! knows how to open a new session, and [`connect_with_retry`] keeps trying
//! until one is available.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use obs_websocket::{ConnectOptions, ObsClient, OutputList, OutputStatus, Stats, Version};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::Result;

/// Queries against a live OBS session.
///
/// Every method is a single round trip. Failures are never retried here;
/// transport failures surface as [`crate::Error::Connection`].
#[async_trait]
pub trait ObsApi: Send + Sync + fmt::Debug {
    async fn get_version(&self) -> Result<Version>;

    async fn get_stats(&self) -> Result<Stats>;

    async fn get_output_list(&self) -> Result<OutputList>;

    async fn get_output_status(&self, output_name: &str) -> Result<OutputStatus>;

    /// Cheap round trip proving the session still works.
    async fn check_alive(&self) -> Result<()> {
        self.get_version().await.map(|_| ())
    }

    async fn is_alive(&self) -> bool {
        self.check_alive().await.is_ok()
    }

    /// Release the underlying connection.
    async fn close(&self) {}
}

#[async_trait]
impl ObsApi for ObsClient {
    async fn get_version(&self) -> Result<Version> {
        Ok(ObsClient::get_version(self).await?)
    }

    async fn get_stats(&self) -> Result<Stats> {
        Ok(ObsClient::get_stats(self).await?)
    }

    async fn get_output_list(&self) -> Result<OutputList> {
        Ok(ObsClient::get_output_list(self).await?)
    }

    async fn get_output_status(&self, output_name: &str) -> Result<OutputStatus> {
        Ok(ObsClient::get_output_status(self, output_name).await?)
    }

    async fn close(&self) {
        ObsClient::close(self).await;
    }
}

/// Opens new upstream sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Human readable endpoint, for logs.
    fn endpoint(&self) -> String;

    async fn connect(&self) -> Result<Arc<dyn ObsApi>>;
}

/// Connects to obs-websocket over TCP.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    options: ConnectOptions,
}

impl WebSocketConnector {
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    fn endpoint(&self) -> String {
        self.options.url()
    }

    async fn connect(&self) -> Result<Arc<dyn ObsApi>> {
        let client = ObsClient::connect(&self.options).await?;
        Ok(Arc::new(client))
    }
}

/// Connect, retrying with a fixed delay until it succeeds.
///
/// There is no attempt limit: OBS being down is an expected condition.
/// Returns `None` only when `cancel` fires.
pub async fn connect_with_retry(
    connector: &dyn Connector,
    retry_delay: Duration,
    cancel: &CancellationToken,
) -> Option<Arc<dyn ObsApi>> {
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            result = connector.connect() => result,
        };

        match result {
            Ok(session) => {
                info!(endpoint = %connector.endpoint(), attempt, "Successfully connected to OBS");
                return Some(session);
            }
            Err(e) => {
                error!(endpoint = %connector.endpoint(), attempt, error = %e, "Failed to connect to OBS");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(retry_delay) => {}
        }
    }
}
