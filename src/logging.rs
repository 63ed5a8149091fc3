//! Logging setup for the command line binary.
//!
//! Library code only emits `tracing` events; the binary decides where they go.
//! `BINDFORGE_LOG` takes precedence over the configured level and accepts the
//! full `EnvFilter` syntax (`bindforge::resolve=debug,warn`).

use crate::config::LoggingConfig;
use crate::error::{BindError, BindResult};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "BINDFORGE_LOG";

/// Install the global subscriber. Logs go to stderr so stdout stays usable
/// for plan output.
pub fn init_logging(config: &LoggingConfig) -> BindResult<()> {
    let level = parse_log_level(&config.level)?;
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level_directive(level)));

    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .try_init()
        .map_err(|e| BindError::ConfigError {
            reason: format!("Failed to install log subscriber: {e}"),
        })?;

    tracing::debug!("Logging initialized with level: {}", level);
    Ok(())
}

/// Parse log level string to tracing Level
pub fn parse_log_level(level: &str) -> BindResult<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(BindError::ConfigError {
            reason: format!("Invalid log level: {level}. Use trace, debug, info, warn, or error"),
        }),
    }
}

/// `EnvFilter` directive for a parsed level; `warning` becomes `warn`.
pub fn level_directive(level: Level) -> String {
    level.as_str().to_lowercase()
}
