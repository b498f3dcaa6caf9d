//! Logging setup
//!
//! `local` logs human-readable text at debug level, `development` logs JSON at
//! debug level, `production` and `undefined` log JSON at info level.
//! `RUST_LOG` overrides the level when set.

use tracing_subscriber::EnvFilter;

use crate::core::config::Mode;

/// Logging initialisation errors
#[derive(Debug, thiserror::Error)]
#[error("failed to initialise logging: {0}")]
pub struct TelemetryError(String);

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Default filter directive for a mode
pub fn default_level(mode: Mode) -> &'static str {
    match mode {
        Mode::Local | Mode::Development => "debug",
        Mode::Production | Mode::Undefined => "info",
    }
}

pub fn log_format(mode: Mode) -> LogFormat {
    match mode {
        Mode::Local => LogFormat::Text,
        _ => LogFormat::Json,
    }
}

/// Install the global subscriber for `mode`
pub fn init(mode: Mode) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(mode)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match log_format(mode) {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };

    result.map_err(|err| TelemetryError(err.to_string()))
}
