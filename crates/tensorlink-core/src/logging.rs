//! Structured logging configuration for the tensorlink runtime.
//!
//! Centralized setup using the `tracing` crate. The boundary environment
//! initializes logging exactly once; `RUST_LOG` overrides the configured
//! level as usual.

use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Trace-level logging (most verbose)
    Trace,
    /// Debug-level logging
    Debug,
    /// Info-level logging
    Info,
    /// Warn-level logging
    Warn,
    /// Error-level logging (least verbose)
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Logging configuration for the tensorlink runtime.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display.
    pub level: LogLevel,
    /// Whether to include thread IDs.
    pub with_thread_ids: bool,
    /// Whether to include source code locations.
    pub with_source_location: bool,
    /// Whether to output in JSON format.
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            with_thread_ids: false,
            with_source_location: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum log level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Enable or disable thread IDs.
    pub fn with_thread_ids(mut self, enable: bool) -> Self {
        self.with_thread_ids = enable;
        self
    }

    /// Enable or disable source code locations.
    pub fn with_source_location(mut self, enable: bool) -> Self {
        self.with_source_location = enable;
        self
    }

    /// Enable or disable JSON output format.
    pub fn with_json_format(mut self, enable: bool) -> Self {
        self.json_format = enable;
        self
    }

    /// Create a development-friendly configuration (verbose).
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            with_thread_ids: true,
            with_source_location: true,
            json_format: false,
        }
    }
}

/// Initialize the global logger with the given configuration.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one is left in place.
pub fn init_logging(config: LoggingConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.to_tracing_level().as_str()))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if config.json_format {
        let fmt_layer = fmt::layer()
            .json()
            .with_thread_ids(config.with_thread_ids)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    } else {
        let fmt_layer = fmt::layer()
            .with_thread_ids(config.with_thread_ids)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location)
            .with_target(config.with_source_location);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    }
}

/// Initialize logging with default configuration.
pub fn init_default_logging() -> bool {
    init_logging(LoggingConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, LogLevel::Warn);
        assert!(!config.with_thread_ids);
        assert!(!config.json_format);
    }

    #[test]
    fn test_logging_config_development() {
        let config = LoggingConfig::development();
        assert_eq!(config.level, LogLevel::Debug);
        assert!(config.with_source_location);
    }

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::new()
            .with_level(LogLevel::Trace)
            .with_thread_ids(true)
            .with_json_format(true);

        assert_eq!(config.level, LogLevel::Trace);
        assert!(config.with_thread_ids);
        assert!(config.json_format);
    }
}
