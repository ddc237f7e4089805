//! Scripted upstream doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use obs_websocket::{Output, OutputList, OutputStatus, Stats, Version};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::upstream::{Connector, ObsApi};

pub fn sample_stats() -> Stats {
    Stats {
        cpu_usage: 12.5,
        memory_usage: 420.0,
        available_disk_space: 100_000.0,
        active_fps: 60.0,
        average_frame_render_time: 1.25,
        render_skipped_frames: 3,
        render_total_frames: 36_000,
        output_skipped_frames: 9,
        output_total_frames: 35_000,
    }
}

pub fn sample_status(congestion: f64, reconnecting: bool) -> OutputStatus {
    OutputStatus {
        output_active: true,
        output_reconnecting: reconnecting,
        output_timecode: Some("00:10:00.000".to_string()),
        output_duration: 600_000,
        output_congestion: congestion,
        output_bytes: 1_048_576,
        output_skipped_frames: 7,
        output_total_frames: 34_000,
    }
}

/// In-memory OBS session.
#[derive(Debug)]
pub struct MockObs {
    stats: Mutex<Stats>,
    outputs: Mutex<Vec<Output>>,
    statuses: Mutex<HashMap<String, OutputStatus>>,
    alive: AtomicBool,
    status_calls: AtomicUsize,
}

impl MockObs {
    /// Reachable OBS with no outputs.
    pub fn idle() -> Self {
        Self {
            stats: Mutex::new(sample_stats()),
            outputs: Mutex::new(Vec::new()),
            statuses: Mutex::new(HashMap::new()),
            alive: AtomicBool::new(true),
            status_calls: AtomicUsize::new(0),
        }
    }

    /// Reachable OBS streaming on `adv_stream` with congestion 0.4 while reconnecting.
    pub fn streaming() -> Self {
        Self::idle()
            .with_output("virtualcam_output", false, None)
            .with_output("adv_stream", true, Some(sample_status(0.4, true)))
    }

    pub fn with_output(self, name: &str, active: bool, status: Option<OutputStatus>) -> Self {
        self.outputs.lock().push(Output {
            output_name: name.to_string(),
            output_kind: "rtmp_output".to_string(),
            output_active: active,
            output_width: 1920,
            output_height: 1080,
        });
        if let Some(status) = status {
            self.statuses.lock().insert(name.to_string(), status);
        }
        self
    }

    pub fn set_stats(&self, stats: Stats) {
        *self.stats.lock() = stats;
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.alive.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::connection("connection reset by peer"))
        }
    }
}

#[async_trait]
impl ObsApi for MockObs {
    async fn get_version(&self) -> Result<Version> {
        self.ensure_alive()?;
        Ok(Version {
            obs_version: "30.2.0".to_string(),
            obs_web_socket_version: "5.5.2".to_string(),
            rpc_version: 1,
            platform: "linux".to_string(),
            platform_description: "Test".to_string(),
        })
    }

    async fn get_stats(&self) -> Result<Stats> {
        self.ensure_alive()?;
        Ok(self.stats.lock().clone())
    }

    async fn get_output_list(&self) -> Result<OutputList> {
        self.ensure_alive()?;
        Ok(OutputList {
            outputs: self.outputs.lock().clone(),
        })
    }

    async fn get_output_status(&self, output_name: &str) -> Result<OutputStatus> {
        self.ensure_alive()?;
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .get(output_name)
            .cloned()
            .ok_or_else(|| Error::protocol(format!("no status for output {output_name}")))
    }
}

/// Connector handing out fresh [`MockObs`] sessions, optionally failing first.
pub struct MockConnector {
    make: fn() -> MockObs,
    failures_left: AtomicUsize,
    attempts: AtomicUsize,
    issued: Mutex<Vec<Arc<MockObs>>>,
}

impl MockConnector {
    pub fn new(make: fn() -> MockObs) -> Self {
        Self {
            make,
            failures_left: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
            issued: Mutex::new(Vec::new()),
        }
    }

    /// Make the next `n` connection attempts fail.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The most recently issued session.
    pub fn last_session(&self) -> Option<Arc<MockObs>> {
        self.issued.lock().last().cloned()
    }

    pub fn sessions_issued(&self) -> usize {
        self.issued.lock().len()
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn endpoint(&self) -> String {
        "mock://obs".to_string()
    }

    async fn connect(&self) -> Result<Arc<dyn ObsApi>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::connection("connection refused"));
        }

        let session = Arc::new((self.make)());
        self.issued.lock().push(session.clone());
        Ok(session)
    }
}
