//! Typed requests and their response payloads.
//!
//! Response structs mark the keys the exporter relies on as required, so a
//! missing key surfaces as a protocol error instead of a silent default.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// A request that can be sent with [`crate::ObsClient::request`].
pub trait ObsRequest {
    /// Value of `requestType`.
    const REQUEST_TYPE: &'static str;

    /// Shape of `responseData`.
    type Response: DeserializeOwned;

    /// Value of `requestData`, if the request takes parameters.
    fn request_data(&self) -> Option<Value> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GetVersion;

#[derive(Debug, Clone, Copy, Default)]
pub struct GetStats;

#[derive(Debug, Clone, Copy, Default)]
pub struct GetOutputList;

#[derive(Debug, Clone)]
pub struct GetOutputStatus {
    pub output_name: String,
}

impl GetOutputStatus {
    pub fn new(output_name: impl Into<String>) -> Self {
        Self {
            output_name: output_name.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub obs_version: String,
    pub obs_web_socket_version: String,
    #[serde(default)]
    pub rpc_version: u32,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub platform_description: String,
}

/// `GetStats` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Process CPU usage in percent.
    pub cpu_usage: f64,
    /// Process memory usage in MB.
    pub memory_usage: f64,
    #[serde(default)]
    pub available_disk_space: f64,
    pub active_fps: f64,
    /// Milliseconds.
    pub average_frame_render_time: f64,
    pub render_skipped_frames: u64,
    pub render_total_frames: u64,
    /// Aggregate over all outputs.
    pub output_skipped_frames: u64,
    pub output_total_frames: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub output_name: String,
    #[serde(default)]
    pub output_kind: String,
    pub output_active: bool,
    #[serde(default)]
    pub output_width: u32,
    #[serde(default)]
    pub output_height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputList {
    pub outputs: Vec<Output>,
}

impl OutputList {
    /// The first output whose active flag is set, in list order.
    pub fn first_active(&self) -> Option<&Output> {
        self.outputs.iter().find(|output| output.output_active)
    }
}

/// `GetOutputStatus` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputStatus {
    pub output_active: bool,
    pub output_reconnecting: bool,
    #[serde(default)]
    pub output_timecode: Option<String>,
    /// Milliseconds.
    pub output_duration: u64,
    pub output_congestion: f64,
    #[serde(default)]
    pub output_bytes: u64,
    pub output_skipped_frames: u64,
    pub output_total_frames: u64,
}

impl ObsRequest for GetVersion {
    const REQUEST_TYPE: &'static str = "GetVersion";
    type Response = Version;
}

impl ObsRequest for GetStats {
    const REQUEST_TYPE: &'static str = "GetStats";
    type Response = Stats;
}

impl ObsRequest for GetOutputList {
    const REQUEST_TYPE: &'static str = "GetOutputList";
    type Response = OutputList;
}

impl ObsRequest for GetOutputStatus {
    const REQUEST_TYPE: &'static str = "GetOutputStatus";
    type Response = OutputStatus;

    fn request_data(&self) -> Option<Value> {
        Some(json!({ "outputName": self.output_name }))
    }
}
