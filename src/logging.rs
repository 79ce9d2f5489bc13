//! Logging initialization.
//!
//! Events go to stderr; stdout is reserved for command output such as the
//! security list or the dry-run plan.

use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber. Level defaults to `info` and can be
/// overridden with `RUST_LOG`.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
