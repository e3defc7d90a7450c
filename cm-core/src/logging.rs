//! Logging setup shared by the certmap binaries.

use std::io;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `verbosity` is a tracing directive string (`error`, `warn`, `info`, `debug`, `trace`);
/// `RUST_LOG` takes precedence when set. Diagnostics go to stderr so that stdout stays reserved
/// for the rendered diagram.
pub fn setup(verbosity: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(verbosity))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
