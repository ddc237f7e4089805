//! Process logging setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "obs_exporter=info,obs_websocket=info,tower_http=warn";

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG`; falls back to [`DEFAULT_LOG_FILTER`].
pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(fmt::layer())
        .init();
}
