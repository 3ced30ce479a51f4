//! # Structured Logging
//!
//! Installs a `tracing` subscriber for the engine's scan events.
//!
//! - Pretty, compact or JSON output on stderr
//! - Level taken from the config, or from `RUST_LOG` when no explicit
//!   filter is configured
//!
//! ## Example
//!
//! ```rust,ignore
//! use dasloc_core::observe::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::verbose());
//! tracing::debug!(angles = 181, "scan finished");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (machine-readable)
    Json,
    /// Pretty format (human-readable, colored)
    Pretty,
    /// Compact format (one line per event)
    #[default]
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Directive string (e.g., "dasloc_core=trace"), overrides `level`
    pub filter: Option<String>,
    /// Include source location (file:line)
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            filter: None,
            source_location: false,
        }
    }
}

impl LogConfig {
    /// Command-line preset: warnings and errors, compact.
    pub fn cli() -> Self {
        Self::default()
    }

    /// Verbose preset: scan progress at debug level.
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            source_location: true,
            ..Default::default()
        }
    }

    /// Quiet preset: errors only.
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            ..Default::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.to_string());
        match self.filter {
            Some(ref directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

/// Initialize the global logging subscriber.
///
/// Only the first call installs a subscriber; later calls are ignored.
pub fn init_logging(config: &LogConfig) {
    let builder = fmt()
        .with_env_filter(config.env_filter())
        .with_writer(std::io::stderr)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    // Already initialised
    let _ = result;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_display() {
        assert_eq!(format!("{}", LogLevel::Debug), "debug");
        assert_eq!(format!("{}", LogLevel::Warn), "warn");
        assert_eq!(format!("{}", LogLevel::Error), "error");
    }

    #[test]
    fn test_config_presets() {
        let cli = LogConfig::cli();
        assert_eq!(cli.level, LogLevel::Warn);
        assert_eq!(cli.format, LogFormat::Compact);

        let verbose = LogConfig::verbose();
        assert_eq!(verbose.level, LogLevel::Debug);
        assert!(verbose.source_location);

        assert_eq!(LogConfig::quiet().level, LogLevel::Error);
    }

    #[test]
    fn test_log_config_yaml() {
        let config: LogConfig = serde_yaml::from_str("level: trace\nformat: json\n").unwrap();
        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(&LogConfig::quiet());
        init_logging(&LogConfig::verbose());
    }
}
