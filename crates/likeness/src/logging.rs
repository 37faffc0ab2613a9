//! Logging initialization.
//!
//! Uses the `tracing` ecosystem with human-readable or JSON output on
//! stderr. Stdout is reserved for command output (`plan`, `config show`,
//! `generate --json`).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// `level` is the default filter directive; `RUST_LOG` overrides it when set.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

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
pub fn init_from_config(
    config: &likeness_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let json_format = json_logs_override || config.logging.format == "json";
    init(&default_level(config, verbose_override), json_format);
}

fn default_level(config: &likeness_core::Config, verbose: bool) -> String {
    let configured = config.logging.level.trim();
    if verbose && !matches!(configured, "debug" | "trace") {
        "debug".to_string()
    } else if configured.is_empty() {
        "info".to_string()
    } else {
        configured.to_string()
    }
}
