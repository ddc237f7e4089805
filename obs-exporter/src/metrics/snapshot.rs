//! One collection cycle against a live OBS session.

use crate::error::{Error, Result};
use crate::metrics::exposition::MetricFamily;
use crate::upstream::ObsApi;

pub const GAUGE_FAMILY: &str = "obsgauge";
pub const COUNTER_FAMILY: &str = "obscounter";

/// Label value of the connectivity gauge.
pub const CONNECTION_METRIC: &str = "obsConnection";

/// Metric values captured from a single collection cycle.
///
/// Counters are OBS's own running totals passed through as-is; they reset
/// whenever OBS restarts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Snapshot {
    pub obs_connection: f64,

    // gauges
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub active_fps: f64,
    pub average_frame_render_time: f64,
    pub output_active: f64,
    pub output_reconnecting: f64,
    pub output_congestion: f64,

    // counters
    pub render_skipped_frames: f64,
    pub render_total_frames: f64,
    pub output_skipped_frames: f64,
    pub output_total_frames: f64,
    pub output_duration: f64,
}

impl Snapshot {
    /// Gauge samples in exposition order.
    pub fn gauges(&self) -> [(&'static str, f64); 8] {
        [
            (CONNECTION_METRIC, self.obs_connection),
            ("cpuUsage", self.cpu_usage),
            ("memoryUsage", self.memory_usage),
            ("activeFps", self.active_fps),
            ("averageFrameRenderTime", self.average_frame_render_time),
            ("outputActive", self.output_active),
            ("outputReconnecting", self.output_reconnecting),
            ("outputCongestion", self.output_congestion),
        ]
    }

    /// Counter samples in exposition order.
    pub fn counters(&self) -> [(&'static str, f64); 5] {
        [
            ("renderSkippedFrames", self.render_skipped_frames),
            ("renderTotalFrames", self.render_total_frames),
            ("outputSkippedFrames", self.output_skipped_frames),
            ("outputTotalFrames", self.output_total_frames),
            ("outputDuration", self.output_duration),
        ]
    }

    /// Every value must be finite.
    pub fn validate(&self) -> Result<()> {
        match self
            .gauges()
            .into_iter()
            .chain(self.counters())
            .find(|(_, value)| !value.is_finite())
        {
            Some((name, value)) => Err(Error::protocol(format!(
                "OBS reported a non-finite value for {name}: {value}"
            ))),
            None => Ok(()),
        }
    }

    /// The `obsgauge` and `obscounter` families for this snapshot.
    pub fn families(&self) -> Vec<MetricFamily> {
        let mut gauge = MetricFamily::gauge(GAUGE_FAMILY, "OBS metrics gauge");
        for (name, value) in self.gauges() {
            gauge.add_metric(name, value);
        }

        let mut counter = MetricFamily::counter(COUNTER_FAMILY, "OBS metrics counter");
        for (name, value) in self.counters() {
            counter.add_metric(name, value);
        }

        vec![gauge, counter]
    }
}

/// Query OBS and assemble a [`Snapshot`].
///
/// Any failed query fails the whole collection; a partial snapshot is never
/// returned.
pub async fn collect(session: &dyn ObsApi) -> Result<Snapshot> {
    let stats = session.get_stats().await?;
    let outputs = session.get_output_list().await?;

    let mut snapshot = Snapshot {
        obs_connection: 1.0,
        cpu_usage: stats.cpu_usage,
        memory_usage: stats.memory_usage,
        active_fps: stats.active_fps,
        average_frame_render_time: stats.average_frame_render_time,
        render_skipped_frames: stats.render_skipped_frames as f64,
        render_total_frames: stats.render_total_frames as f64,
        ..Snapshot::default()
    };

    if let Some(output) = outputs.first_active() {
        let status = session.get_output_status(&output.output_name).await?;

        snapshot.output_active = 1.0;
        snapshot.output_reconnecting = if status.output_reconnecting { 1.0 } else { 0.0 };
        snapshot.output_congestion = status.output_congestion;
        snapshot.output_duration = status.output_duration as f64;
        snapshot.output_skipped_frames = status.output_skipped_frames as f64;
        snapshot.output_total_frames = status.output_total_frames as f64;
    }

    snapshot.validate()?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockObs, sample_stats, sample_status};

    #[tokio::test]
    async fn test_collect_without_active_output() {
        let session = MockObs::idle().with_output("adv_stream", false, None);
        let snapshot = collect(&session).await.unwrap();

        assert_eq!(snapshot.obs_connection, 1.0);
        assert_eq!(snapshot.cpu_usage, 12.5);
        assert_eq!(snapshot.render_total_frames, 36_000.0);
        assert_eq!(snapshot.output_active, 0.0);
        assert_eq!(snapshot.output_congestion, 0.0);
        assert_eq!(snapshot.output_reconnecting, 0.0);
        assert_eq!(snapshot.output_duration, 0.0);
        assert_eq!(snapshot.output_skipped_frames, 0.0);
        assert_eq!(snapshot.output_total_frames, 0.0);
        assert_eq!(session.status_calls(), 0);
    }

    #[tokio::test]
    async fn test_collect_with_active_output() {
        let session = MockObs::streaming();
        let snapshot = collect(&session).await.unwrap();

        assert_eq!(snapshot.obs_connection, 1.0);
        assert_eq!(snapshot.output_active, 1.0);
        assert_eq!(snapshot.output_congestion, 0.4);
        assert_eq!(snapshot.output_reconnecting, 1.0);
        assert_eq!(snapshot.output_duration, 600_000.0);
        assert_eq!(snapshot.output_skipped_frames, 7.0);
        assert_eq!(snapshot.output_total_frames, 34_000.0);
        assert_eq!(session.status_calls(), 1);
    }

    #[tokio::test]
    async fn test_collect_picks_first_active_output() {
        let session = MockObs::idle()
            .with_output("adv_stream", true, Some(sample_status(0.1, false)))
            .with_output("adv_file_output", true, Some(sample_status(0.9, true)));
        let snapshot = collect(&session).await.unwrap();

        assert_eq!(snapshot.output_congestion, 0.1);
        assert_eq!(snapshot.output_reconnecting, 0.0);
    }

    #[tokio::test]
    async fn test_collect_fails_on_lost_connection() {
        let session = MockObs::streaming();
        session.set_alive(false);

        let err = collect(&session).await.unwrap_err();
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn test_collect_fails_when_status_query_fails() {
        // Active output whose status query errors: no partial snapshot.
        let session = MockObs::idle().with_output("adv_stream", true, None);
        let err = collect(&session).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_collect_rejects_non_finite_values() {
        let session = MockObs::idle();
        let mut stats = sample_stats();
        stats.active_fps = f64::NAN;
        session.set_stats(stats);

        let err = collect(&session).await.unwrap_err();
        assert!(err.to_string().contains("activeFps"));
    }

    #[tokio::test]
    async fn test_every_metric_present_and_finite() {
        for session in [MockObs::idle(), MockObs::streaming()] {
            let snapshot = collect(&session).await.unwrap();
            let families = snapshot.families();

            assert_eq!(families.len(), 2);
            assert_eq!(families[0].samples.len(), 8);
            assert_eq!(families[1].samples.len(), 5);
            assert!(
                families
                    .iter()
                    .flat_map(|f| &f.samples)
                    .all(|s| s.value.is_finite())
            );
        }
    }
}
