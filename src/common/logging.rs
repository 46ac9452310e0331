//! Logging and tracing configuration
//!
//! Both the runner and the bridge process log to stderr. The debug flag
//! raises the crate's default level so shell steps and the test engine
//! environment become visible.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directives for the given debug flag
pub fn default_directives(debug: bool) -> &'static str {
    if debug {
        "owl=debug,info"
    } else {
        "owl=info,warn"
    }
}

/// Initialize tracing for the runner
///
/// Logs are controlled by the `RUST_LOG` environment variable when set.
/// Calling this more than once keeps the first subscriber.
pub fn init_cli(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

/// Initialize tracing for the bridge process
///
/// The bridge inherits the runner's stdio, so the debug flag arrives through
/// the `OWL_DEBUG` environment variable instead of a CLI flag.
pub fn init_bridge() {
    let debug = std::env::var(super::ENV_DEBUG)
        .map(|v| v == "true")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init();
}
