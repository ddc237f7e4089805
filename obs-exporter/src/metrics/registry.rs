//! Registry bridging metric producers to the scrape endpoint.
//!
//! The registry holds at most one producer. Swapping producers happens under a
//! single write lock, so a concurrent scrape observes either the old producer
//! or the new one, never both and never a half-installed state.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::exposition::{MetricFamily, render};
use super::snapshot::{CONNECTION_METRIC, GAUGE_FAMILY, collect};
use crate::error::{Error, Result};
use crate::upstream::ObsApi;

/// Yields metric families when the endpoint is scraped.
#[async_trait]
pub trait MetricProducer: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    async fn produce(&self) -> Result<Vec<MetricFamily>>;
}

/// Reports `obsConnection 0` while there is no OBS session.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderProducer;

#[async_trait]
impl MetricProducer for PlaceholderProducer {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    async fn produce(&self) -> Result<Vec<MetricFamily>> {
        let mut gauge = MetricFamily::gauge(GAUGE_FAMILY, "Default OBS connection gauge");
        gauge.add_metric(CONNECTION_METRIC, 0.0);
        Ok(vec![gauge])
    }
}

/// Collects a fresh snapshot from the OBS session on every scrape.
#[derive(Debug)]
pub struct LiveProducer {
    session: Arc<dyn ObsApi>,
}

impl LiveProducer {
    pub fn new(session: Arc<dyn ObsApi>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl MetricProducer for LiveProducer {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn produce(&self) -> Result<Vec<MetricFamily>> {
        let snapshot = collect(self.session.as_ref()).await?;
        Ok(snapshot.families())
    }
}

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    producer: RwLock<Option<Arc<dyn MetricProducer>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a producer into an empty registry.
    ///
    /// Fails with [`Error::DuplicateProducer`] if one is already present; use
    /// [`MetricsRegistry::replace`] to swap.
    pub fn register(&self, producer: Arc<dyn MetricProducer>) -> Result<()> {
        let mut slot = self.producer.write();
        if slot.is_some() {
            return Err(Error::DuplicateProducer);
        }
        debug!(producer = producer.name(), "Registered metric producer");
        *slot = Some(producer);
        Ok(())
    }

    /// Atomically replace the current producer, returning the previous one.
    pub fn replace(&self, producer: Arc<dyn MetricProducer>) -> Option<Arc<dyn MetricProducer>> {
        let name = producer.name();
        let previous = self.producer.write().replace(producer);
        debug!(
            producer = name,
            previous = previous.as_ref().map(|p| p.name()),
            "Swapped metric producer"
        );
        previous
    }

    pub fn register_placeholder(&self) {
        self.replace(Arc::new(PlaceholderProducer));
    }

    pub fn register_live(&self, session: Arc<dyn ObsApi>) {
        self.replace(Arc::new(LiveProducer::new(session)));
    }

    /// Remove the current producer.
    pub fn clear(&self) {
        if let Some(previous) = self.producer.write().take() {
            debug!(producer = previous.name(), "Cleared metric producer");
        }
    }

    /// Name of the current producer, if any.
    pub fn current(&self) -> Option<&'static str> {
        self.producer.read().as_ref().map(|p| p.name())
    }

    /// Collect from the current producer.
    ///
    /// The lock is only held long enough to clone the producer handle; the
    /// (possibly slow) collection runs outside it.
    pub async fn gather(&self) -> Result<Vec<MetricFamily>> {
        let producer = self.producer.read().clone();
        match producer {
            Some(producer) => producer.produce().await,
            None => Ok(Vec::new()),
        }
    }

    /// Collect and render in the text exposition format.
    pub async fn render(&self) -> Result<String> {
        let families = self.gather().await?;
        Ok(render(&families))
    }
}
