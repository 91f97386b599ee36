//! Configuration management
//!
//! Runtime configuration loaded from JSON files, so the sample rate, the fake
//! engine cadence and the log level can be changed without recompiling.
//! Every section has defaults; a missing or broken file falls back to them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::audio::format::{StreamFormat, MAX_SAMPLE_RATE_HZ};
use crate::error::ConfigError;

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: f64 = 44_100.0;

/// Default number of fake engine ticks per `start`
pub const DEFAULT_FAKE_TICKS: u32 = 3;

/// Default delay between fake engine ticks in milliseconds
pub const DEFAULT_FAKE_INTERVAL_MS: u64 = 1_000;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub fake: FakeConfig,
    pub logging: LoggingConfig,
}

/// Output engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz requested from the device
    pub sample_rate: f64,
    /// Channel count; only mono (1) is accepted
    pub channels: u16,
    /// Fixed buffer size hint in frames (None = let the platform decide)
    pub buffer_frames: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            buffer_frames: None,
        }
    }
}

impl EngineConfig {
    /// Mono config at the given rate with a platform-chosen buffer size
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }
}

/// Fake engine cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FakeConfig {
    /// Number of callback invocations per `start`
    pub ticks: u32,
    /// Real-time delay between consecutive invocations
    pub interval_ms: u64,
}

impl Default for FakeConfig {
    fn default() -> Self {
        Self {
            ticks: DEFAULT_FAKE_TICKS,
            interval_ms: DEFAULT_FAKE_INTERVAL_MS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            fake: FakeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse and validate configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    ///
    /// Unlike [`AppConfig::load_from_file`] this reports every failure.
    pub fn try_load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path).map_err(|err| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_json_str(&contents)
    }

    /// Load configuration from JSON file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file doesn't exist,
    /// isn't valid JSON or fails validation
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_file(&path) {
            Ok(config) => {
                log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                config
            }
            Err(err) => {
                log::warn!(
                    "[Config] Failed to load {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Check that every value is usable before any device is touched
    pub fn validate(&self) -> Result<(), ConfigError> {
        if StreamFormat::mono_f32(self.engine.sample_rate).is_err() {
            return Err(ConfigError::Invalid {
                field: "engine.sample_rate".to_string(),
                reason: format!(
                    "must round to 1..={} Hz (got {})",
                    MAX_SAMPLE_RATE_HZ, self.engine.sample_rate
                ),
            });
        }
        if self.engine.channels != 1 {
            return Err(ConfigError::Invalid {
                field: "engine.channels".to_string(),
                reason: format!("only mono is supported (got {})", self.engine.channels),
            });
        }
        if self.engine.buffer_frames == Some(0) {
            return Err(ConfigError::Invalid {
                field: "engine.buffer_frames".to_string(),
                reason: "must be greater than 0 when set".to_string(),
            });
        }
        if self.fake.ticks == 0 {
            return Err(ConfigError::Invalid {
                field: "fake.ticks".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid {
                field: "logging.level".to_string(),
                reason: format!(
                    "expected one of {} (got {:?})",
                    LOG_LEVELS.join(", "),
                    self.logging.level
                ),
            });
        }
        Ok(())
    }
}
