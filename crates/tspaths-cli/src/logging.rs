//! Subscriber setup. Library crates only emit `tracing` events.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const TARGETS: &[&str] = &["tspaths_core", "tspaths_cli"];

/// Install the global subscriber. Everything goes to stderr so stdout stays
/// parseable.
///
/// `verbosity` 0/1/2+ maps our own targets to INFO/DEBUG/TRACE on top of
/// `RUST_LOG` (default `warn`). With `json`, events are JSON lines.
pub fn init(verbosity: u8, json: bool) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = TARGETS.iter().fold(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        |filter, target| match format!("{target}={level}").parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        },
    );

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
