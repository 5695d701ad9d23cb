//! Service configuration.
//!
//! Loaded once at startup from a TOML file (default `./hazards.toml`,
//! overridable with `HAZMON_CONFIG`). Every section is optional; anything
//! missing falls back to the built-in defaults, so a missing file is not an
//! error for the daemon (see `load_or_default`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::hazards::HazardThresholds;
use crate::logging::LogLevel;

pub const DEFAULT_CONFIG_PATH: &str = "./hazards.toml";

// ============================================================================
// Config structures
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub thresholds: HazardThresholds,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between simulated sensor readings.
    pub poll_interval_secs: u64,
    /// Weather snapshots older than this are ignored when scoring.
    pub max_weather_age_minutes: u64,
    /// Refresh weather every N ticks. 0 disables weather fetching.
    pub weather_every_ticks: u64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
            max_weather_age_minutes: 60,
            weather_every_ticks: 30,
            // Indore, the platform's default user location
            latitude: 22.7196,
            longitude: 75.8577,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: true,
        }
    }
}

impl LoggingConfig {
    /// Parsed minimum level. Unknown names fall back to INFO.
    pub fn min_level(&self) -> LogLevel {
        LogLevel::parse(&self.level).unwrap_or(LogLevel::Info)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The file exists but could not be read.
    Io(String),
    /// The file is not valid TOML or does not match the schema.
    Parse(String),
    /// The file parsed but the values are unusable.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Parses and validates a configuration document.
pub fn parse_config(text: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig =
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.thresholds.validate().map_err(ConfigError::Invalid)?;
    if config.monitor.poll_interval_secs == 0 {
        return Err(ConfigError::Invalid(
            "monitor.poll_interval_secs must be at least 1".to_string(),
        ));
    }
    Ok(config)
}

/// Reads and parses the configuration file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
    parse_config(&text)
}

/// Like `load_config`, but a missing file yields the defaults.
/// A file that exists but is broken is still an error.
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        Ok(ServiceConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
