//! Log subscriber setup for the binaries

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global fmt subscriber
///
/// `RUST_LOG` takes precedence; otherwise warnings and errors are shown, or
/// everything down to `debug` when `debug` is set. Logs go to stderr so they
/// never mix with command output on stdout.
pub fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
