//! Structured logging setup for specloop
//!
//! Round progress is logged at `info`, per-token and per-path warnings at
//! `warn`, per-line detail at `debug`. Fatal conditions go to `error` with a
//! `FATAL:` marker.
//!
//! # Example
//!
//! ```no_run
//! use specloop::util::logging;
//!
//! // With environment: SPECLOOP_LOG_LEVEL=debug
//! logging::init_from_env();
//!
//! tracing::info!("Building package foo round 1");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., specloop::build) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Reads `SPECLOOP_LOG_LEVEL` and `SPECLOOP_LOG_JSON`
    pub fn from_env() -> Self {
        let level_str = env::var("SPECLOOP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let use_json = env::var("SPECLOOP_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level: parse_level(&level_str),
            use_json,
            ..Default::default()
        }
    }

    /// Filter applied when `RUST_LOG` is not set
    pub fn default_directive(&self) -> String {
        format!("specloop={}", self.level)
    }
}

/// Parses a log level from a string
///
/// Unknown names fall back to `Level::INFO`.
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Initializes the logging system with the provided configuration
///
/// Only the first call has any effect. Output goes to stderr so that reports
/// printed on stdout stay machine-readable.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}

/// Initializes logging from `SPECLOOP_LOG_LEVEL`, `SPECLOOP_LOG_JSON` and `RUST_LOG`
pub fn init_from_env() {
    init_logging(LoggingConfig::from_env());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
        assert_eq!(parse_level("INFO"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("loud"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_default_directive() {
        let config = LoggingConfig::with_level(Level::DEBUG);
        assert_eq!(config.default_directive(), "specloop=DEBUG");
        assert!(!config.use_json);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let old_level = env::var("SPECLOOP_LOG_LEVEL").ok();
        let old_json = env::var("SPECLOOP_LOG_JSON").ok();
        env::set_var("SPECLOOP_LOG_LEVEL", "warn");
        env::set_var("SPECLOOP_LOG_JSON", "true");

        let config = LoggingConfig::from_env();

        match old_level {
            Some(v) => env::set_var("SPECLOOP_LOG_LEVEL", v),
            None => env::remove_var("SPECLOOP_LOG_LEVEL"),
        }
        match old_json {
            Some(v) => env::set_var("SPECLOOP_LOG_JSON", v),
            None => env::remove_var("SPECLOOP_LOG_JSON"),
        }

        assert_eq!(config.level, Level::WARN);
        assert!(config.use_json);
    }
}
