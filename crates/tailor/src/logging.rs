//! Logging initialization.
//!
//! Logs go to stderr; stdout is reserved for command output such as
//! classification JSON.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

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

/// Initialize logging from the `[logging]` config section.
///
/// `--verbose` forces debug level; `--json-logs` forces JSON output.
pub fn init_from_config(config: &tailor_core::Config, verbose: bool, json_logs: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let json_format = json_logs || config.logging.format == "json";
    init(level, json_format);
}
