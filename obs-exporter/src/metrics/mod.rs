//! Metrics collection and exposition.
//!
//! - [`snapshot`]: one collection cycle against OBS
//! - [`registry`]: the producer currently answering scrapes
//! - [`exposition`]: Prometheus text format rendering
//!
//! Exactly two families are ever exposed:
//!
//! ```text
//! obsgauge{metric="obsConnection|cpuUsage|memoryUsage|activeFps|
//!                  averageFrameRenderTime|outputActive|outputReconnecting|
//!                  outputCongestion"}
//! obscounter_total{metric="renderSkippedFrames|renderTotalFrames|
//!                          outputSkippedFrames|outputTotalFrames|outputDuration"}
//! ```

pub mod exposition;
pub mod registry;
pub mod snapshot;

pub use exposition::{MetricFamily, MetricKind, Sample, TEXT_FORMAT};
pub use registry::{LiveProducer, MetricProducer, MetricsRegistry, PlaceholderProducer};
pub use snapshot::{Snapshot, collect};
