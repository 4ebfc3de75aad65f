//! Configuration for the activity detector.

use crate::core::buffer::DEFAULT_WINDOW_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Samples kept per channel before a prediction is made
    pub window_size: usize,

    /// Readings per second, per sensor, for the synthetic source
    pub sample_rate_hz: f64,

    /// Which sensors to read
    pub sources: SourceConfig,

    /// Dense model weights; the heuristic classifier is used when unset
    pub model_path: Option<PathBuf>,

    /// Where inference runs
    pub inference: InferenceMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            sample_rate_hz: 50.0,
            sources: SourceConfig::default(),
            model_path: None,
            inference: InferenceMode::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("activity-detector")
            .join("config.json")
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::InvalidValue(
                "window_size must be at least 1".to_string(),
            ));
        }
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "sample_rate_hz must be positive, got {}",
                self.sample_rate_hz
            )));
        }
        if !self.sources.any_enabled() {
            return Err(ConfigError::InvalidValue(
                "at least one sensor source must be enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for which sensors to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub accelerometer: bool,
    pub gyroscope: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            accelerometer: true,
            gyroscope: true,
        }
    }
}

impl SourceConfig {
    /// Parse source configuration from a comma-separated string.
    pub fn from_csv(s: &str) -> Self {
        let sources: Vec<String> = s.split(',').map(|s| s.trim().to_lowercase()).collect();

        Self {
            accelerometer: sources
                .iter()
                .any(|s| s == "accelerometer" || s == "accel" || s == "all"),
            gyroscope: sources
                .iter()
                .any(|s| s == "gyroscope" || s == "gyro" || s == "all"),
        }
    }

    /// Check if at least one source is enabled.
    pub fn any_enabled(&self) -> bool {
        self.accelerometer || self.gyroscope
    }
}

/// Where the classifier runs relative to ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMode {
    /// On the ingesting thread, before `ingest` returns
    #[default]
    Inline,
    /// On a dedicated worker thread, newest request wins
    Decoupled,
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidValue(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
