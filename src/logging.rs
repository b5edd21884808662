use crate::config::LOG_VAR;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. The filter comes from `ESTIMATE_TOOL_LOG`, then
/// `RUST_LOG`, then defaults to `info`. Calling it twice is harmless.
pub fn init() {
    let filter = std::env::var(LOG_VAR)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
