//! obs-websocket: a small request/response client for OBS Studio's websocket
//! control protocol (version 5).
//!
//! ## Core Types
//!
//! - [`ObsClient`] - An identified session; serializes requests on one socket
//! - [`ConnectOptions`] - Host, port, shared secret and timeout
//! - [`ObsRequest`] - Trait implemented by every typed request
//!
//! ## Requests
//!
//! - [`GetVersion`] / [`Version`]
//! - [`GetStats`] / [`Stats`]
//! - [`GetOutputList`] / [`OutputList`]
//! - [`GetOutputStatus`] / [`OutputStatus`]
//!
//! Event subscriptions are not supported: the client identifies with an empty
//! subscription mask and discards any event frame it receives.

pub mod client;
pub mod error;
pub mod protocol;
pub mod requests;

pub use client::{ConnectOptions, ObsClient};
pub use error::{ObsError, Result};
pub use requests::{
    GetOutputList, GetOutputStatus, GetStats, GetVersion, ObsRequest, Output, OutputList,
    OutputStatus, Stats, Version,
};
