//! Command-line arguments and validated exporter configuration.

use std::net::Ipv6Addr;
use std::time::Duration;

use clap::Parser;
use obs_websocket::ConnectOptions;

use crate::error::{Error, Result};
use crate::server::MetricsServerConfig;
use crate::supervisor::SupervisorConfig;

/// OBS Exporter: export OBS Studio metrics to Prometheus.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// OBS Studio WebSocket host
    #[arg(long, alias = "obs_host", env = "OBS_HOST", default_value = "localhost")]
    pub obs_host: String,

    /// OBS Studio WebSocket port
    #[arg(long, alias = "obs_port", env = "OBS_PORT", default_value_t = 4455)]
    pub obs_port: u16,

    /// OBS Studio WebSocket password (empty when authentication is disabled)
    #[arg(long, env = "OBS_PASSWORD", hide_env_values = true)]
    pub obs_password: Option<String>,

    /// Port for Prometheus metrics
    #[arg(
        long,
        alias = "prometheus_exporter_port",
        env = "EXPORTER_PORT",
        default_value_t = 9000
    )]
    pub prometheus_exporter_port: u16,

    /// Address the metrics endpoint binds to
    #[arg(long, env = "EXPORTER_BIND", default_value = "127.0.0.1")]
    pub bind_address: String,

    /// Timeout in seconds for connecting and for each OBS request
    #[arg(long, env = "OBS_TIMEOUT", default_value_t = 3)]
    pub timeout_secs: u64,
}

/// Everything the exporter needs to run.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub upstream: ConnectOptions,
    pub server: MetricsServerConfig,
    pub supervisor: SupervisorConfig,
}

impl ExporterConfig {
    /// Build and validate the configuration from parsed arguments.
    pub fn from_args(args: Args) -> Result<Self> {
        let password = args.obs_password.filter(|p| !p.is_empty());

        let config = Self {
            upstream: ConnectOptions {
                host: args.obs_host.trim().to_string(),
                port: args.obs_port,
                password,
                timeout: Duration::from_secs(args.timeout_secs),
            },
            server: MetricsServerConfig {
                bind_address: args.bind_address.trim().to_string(),
                port: args.prometheus_exporter_port,
            },
            supervisor: SupervisorConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.upstream.host.is_empty() {
            return Err(Error::config("OBS host must not be empty"));
        }
        // A bare IPv6 address is bracketed when the URL is built.
        if self.upstream.host.parse::<Ipv6Addr>().is_err() {
            url::Host::parse(&self.upstream.host).map_err(|e| {
                Error::config(format!("Invalid OBS host {:?}: {}", self.upstream.host, e))
            })?;
        }
        if self.upstream.port == 0 {
            return Err(Error::config("OBS port must be between 1 and 65535"));
        }
        if self.upstream.timeout.is_zero() {
            return Err(Error::config("timeout must be at least one second"));
        }
        if self.server.port == 0 {
            return Err(Error::config("exporter port must be between 1 and 65535"));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}
