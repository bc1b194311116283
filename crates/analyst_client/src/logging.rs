//! Log setup for binaries. Libraries only emit `tracing` events.

use tracing_subscriber::EnvFilter;

use crate::config::Config;

const DEFAULT_FILTER: &str = "warn";

/// Filter directive in effect: `RUST_LOG`, else the config's `log.filter`,
/// else `warn`.
pub fn filter_directive(config: &Config) -> String {
    std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| config.log.filter.clone())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install a stderr `fmt` subscriber. A second call is a no-op.
pub fn init(config: &Config) {
    let filter = EnvFilter::try_new(filter_directive(config))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
