//! obs-exporter library crate.
//!
//! Polls OBS Studio over obs-websocket and republishes its statistics in the
//! Prometheus text format.
//!
//! - [`upstream`] - OBS session trait, connector and retrying connect
//! - [`metrics`] - snapshot collection, producer registry, text rendering
//! - [`server`] - HTTP endpoint serving the registry
//! - [`supervisor`] - connect / watch / reconnect state machine
//! - [`config`] - command-line arguments and validation

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod supervisor;
pub mod upstream;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
