use std::io;

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` when set and valid, otherwise `fallback`. An unparsable
/// fallback degrades to `warn`.
fn make_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Initializes logging. Call once at startup.
///
/// - Output goes to stderr so it never interleaves with prompts on stdout.
/// - Timestamps and targets are stripped to keep terminal output short.
/// - A second call is a no-op.
pub fn init_logging(fallback_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(make_filter(fallback_level))
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}
