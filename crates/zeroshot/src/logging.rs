//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem for structured logging with support for
//! both human-readable and JSON output formats.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// # Arguments
///
/// * `verbose` - If true, enables DEBUG level logging; otherwise `level`.
/// * `level` - Default level when not verbose (error, warn, info, ...).
/// * `json_format` - If true, outputs structured JSON logs; otherwise pretty-printed.
///
/// # Notes
///
/// - Log output goes to stderr (stdout is reserved for command output)
/// - The RUST_LOG environment variable can override the log level
pub fn init(verbose: bool, level: &str, json_format: bool) {
    let default_level = if verbose && level != "trace" {
        "debug"
    } else {
        level
    };
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

/// Initialize logging from the `[logging]` config section.
///
/// `verbose_override` comes from `--verbose` or `serve --debug`.
pub fn init_from_config(
    config: &zeroshot_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let verbose = verbose_override || config.server.debug;
    let json_format = json_logs_override || config.logging.format == "json";
    init(verbose, &config.logging.level, json_format);
}
