//! Logging infrastructure for Zen.
//!
//! Provides centralized tracing setup for the `zen` binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging with the default `warn` level
///
/// The terminal front end redraws a countdown line in place, so routine
/// session logging stays below the default threshold. Set `RUST_LOG=info`
/// (or `debug`) to see session lifecycle events.
pub fn init() {
    init_with_level("warn")
}

/// Initialize logging with a specific default level
///
/// # Arguments
/// * `default_level` - Default log level (debug, info, warn, error)
///
/// This can still be overridden by RUST_LOG environment variable.
/// Output goes to stderr so it never interleaves with command output.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
