//! Diagnostic logging setup

use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr
///
/// An invalid filter falls back to `warn`. Calling this twice is harmless.
pub fn init(filter: &str) {
    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
