//! # Configuration System
//!
//! YAML configuration for localization runs:
//!
//! - Array description (length, microphone count, optional sample rate)
//! - Scan settings (propagation model, angle grid, distance, window)
//! - Logging
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `DASLOC_CONFIG` environment variable
//! 2. `./dasloc.yaml` (current directory)
//! 3. `~/.config/dasloc/config.yaml` (user config)
//! 4. `/etc/dasloc/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! array:
//!   array_length: 0.35
//!   mic_count: 8
//!
//! scan:
//!   model: point
//!   distance: 2.0
//!   window: true
//!
//! logging:
//!   level: debug
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::beamformer::PropagationModel;
use crate::geometry::ArrayConfig;
use crate::observe::LogConfig;
use crate::types::DasResult;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "DASLOC_CONFIG";

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration file not found
    NotFound(String),
    /// Failed to read configuration file
    ReadError(String),
    /// Failed to parse configuration
    ParseError(String),
    /// Invalid configuration value
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(msg) => write!(f, "config not found: {}", msg),
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Microphone array description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArraySettings {
    /// Distance between first and last microphone in meters
    pub array_length: f64,
    /// Number of microphones
    pub mic_count: usize,
    /// Sample rate in Hz; the recording's rate is used when unset
    pub sample_rate: Option<f64>,
}

impl Default for ArraySettings {
    fn default() -> Self {
        Self {
            array_length: 0.35,
            mic_count: 8,
            sample_rate: None,
        }
    }
}

impl ArraySettings {
    /// Build the engine's array description.
    ///
    /// `file_rate` is the recording's sample rate, overridden by
    /// `sample_rate` when that is set.
    pub fn to_array_config(&self, file_rate: f64) -> DasResult<ArrayConfig> {
        ArrayConfig::from_array_length(
            self.array_length,
            self.mic_count,
            self.sample_rate.unwrap_or(file_rate),
        )
    }
}

/// Scan grid and options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Propagation model (plane, point)
    pub model: PropagationModel,
    /// First angle of the plane wave scan in degrees
    pub start_angle: i32,
    /// Last angle of the plane wave scan in degrees
    pub stop_angle: i32,
    /// Angle step of the plane wave scan in degrees
    pub step: i32,
    /// Distance to the source plane in meters (point model)
    pub distance: f64,
    /// Apply a Hann window across the microphones
    pub window: bool,
    /// Spread scan steps over worker threads
    pub parallel: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            model: PropagationModel::Plane,
            start_angle: -90,
            stop_angle: 90,
            step: 1,
            distance: 1.0,
            window: false,
            parallel: true,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DasConfig {
    pub array: ArraySettings,
    pub scan: ScanSettings,
    pub logging: LogConfig,
}

impl DasConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns default config if no file is found. A path named by
    /// `DASLOC_CONFIG` that does not exist is an error.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!(
                    "{} (from {})",
                    path.display(),
                    CONFIG_ENV_VAR
                )));
            }
            return Self::load_from(&path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./dasloc.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "dasloc") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/dasloc/config.yaml"));

        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        if !(self.array.array_length > 0.0) {
            return invalid("array_length must be positive");
        }
        if self.array.mic_count < 2 {
            return invalid("mic_count must be at least 2");
        }
        if let Some(rate) = self.array.sample_rate {
            if !(rate > 0.0) {
                return invalid("sample_rate must be positive");
            }
        }

        let scan = &self.scan;
        if scan.step <= 0 {
            return invalid("step must be > 0");
        }
        if scan.start_angle < -90 || scan.stop_angle > 90 {
            return invalid("scan angles must lie in [-90, 90]");
        }
        if scan.start_angle > scan.stop_angle || scan.stop_angle - scan.start_angle < scan.step {
            return invalid("angle range must span at least one step");
        }
        if scan.model == PropagationModel::Point && !(scan.distance > 0.0) {
            return invalid("distance must be positive for the point source model");
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        let config = Self {
            scan: ScanSettings {
                model: PropagationModel::Point,
                distance: 2.0,
                window: true,
                ..Default::default()
            },
            ..Default::default()
        };

        serde_yaml::to_string(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::LogLevel;

    #[test]
    fn test_default_config() {
        let config = DasConfig::default();
        assert_eq!(config.array.mic_count, 8);
        assert_eq!(config.scan.model, PropagationModel::Plane);
        assert_eq!(config.scan.start_angle, -90);
        assert_eq!(config.scan.stop_angle, 90);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
array:
  array_length: 0.7
  mic_count: 16
  sample_rate: 44100.0
scan:
  model: point
  distance: 1.5
  window: true
logging:
  level: debug
"#;
        let config = DasConfig::parse(yaml).unwrap();
        assert_eq!(config.array.mic_count, 16);
        assert_eq!(config.array.sample_rate, Some(44100.0));
        assert_eq!(config.scan.model, PropagationModel::Point);
        assert_eq!(config.scan.distance, 1.5);
        assert!(config.scan.window);
        assert_eq!(config.logging.level, LogLevel::Debug);
        // Unset fields keep their defaults
        assert_eq!(config.scan.step, 1);
        assert!(config.scan.parallel);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        assert!(matches!(
            DasConfig::parse("scan:\n  model: spherical\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_to_array_config() {
        let settings = ArraySettings::default();
        let c = settings.to_array_config(48_000.0).unwrap();
        assert!((c.pitch() - 0.05).abs() < 1e-12);
        assert_eq!(c.sample_rate(), 48_000.0);

        let settings = ArraySettings {
            sample_rate: Some(16_000.0),
            ..Default::default()
        };
        assert_eq!(settings.to_array_config(48_000.0).unwrap().sample_rate(), 16_000.0);
    }

    #[test]
    fn test_validation() {
        let mut config = DasConfig::default();
        config.array.mic_count = 1;
        assert!(config.validate().is_err());

        let mut config = DasConfig::default();
        config.scan.start_angle = 10;
        config.scan.stop_angle = 10;
        assert!(config.validate().is_err());

        let mut config = DasConfig::default();
        config.scan.model = PropagationModel::Point;
        config.scan.distance = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_example_yaml() {
        let yaml = DasConfig::example_yaml();
        assert!(yaml.contains("array:"));
        assert!(yaml.contains("model: point"));

        let parsed = DasConfig::parse(&yaml).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.scan.distance, 2.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dasloc.yaml");
        let mut config = DasConfig::default();
        config.scan.window = true;
        config.save(&path).unwrap();
        assert_eq!(DasConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            DasConfig::load_from(Path::new("/nonexistent/dasloc.yaml")),
            Err(ConfigError::ReadError(_))
        ));
    }

    #[test]
    fn test_config_search_paths() {
        let paths = DasConfig::config_search_paths();
        assert!(paths[0].ends_with("dasloc.yaml"));
        assert!(paths.last().unwrap().starts_with("/etc/dasloc"));
    }
}
