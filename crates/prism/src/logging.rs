//! Logging setup on the `tracing` ecosystem.
//!
//! Logs go to stderr; stdout carries reports. `RUST_LOG` overrides the
//! level chosen here.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber: debug when `verbose`, info otherwise;
/// JSON lines when `json_format`, human-readable otherwise.
pub fn init(verbose: bool, json_format: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize from `[logging]`; the CLI flags can only turn things on.
pub fn init_from_config(config: &prism_core::Config, verbose: bool, json_logs: bool) {
    let (verbose, json_format) = resolve(&config.logging, verbose, json_logs);
    init(verbose, json_format);
}

fn resolve(logging: &prism_core::config::LoggingConfig, verbose: bool, json_logs: bool) -> (bool, bool) {
    let level = logging.level.to_lowercase();
    (
        verbose || level == "debug" || level == "trace",
        json_logs || logging.format.eq_ignore_ascii_case("json"),
    )
}
