//! Configuration management for guardian.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "guardian";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "guardian.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `GUARDIAN_`, sections separated by `__`,
///    e.g. `GUARDIAN_ADVISORY__API_KEY`)
/// 2. TOML config file at `~/.config/guardian/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Escape plan configuration.
    pub plan: PlanConfig,
    /// Drill session configuration.
    pub drills: DrillConfig,
    /// Remote advisory configuration.
    pub advisory: AdvisoryConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/guardian/guardian.db`
    pub database_path: Option<PathBuf>,
}

/// Escape plan configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Longest edge, in pixels, a stored background image may have.
    pub max_background_edge: u32,
    /// JPEG quality (1-100) used when re-encoding uploaded backgrounds.
    pub background_quality: u8,
    /// JPEG quality (1-100) used for the generated example plan.
    pub example_quality: u8,
    /// Width of the freehand overlay raster in pixels.
    pub overlay_width: u32,
    /// Height of the freehand overlay raster in pixels.
    pub overlay_height: u32,
}

/// Drill session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillConfig {
    /// Interval between session timer ticks in milliseconds.
    pub tick_interval_ms: u64,
}

/// Remote advisory configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// Whether the remote advisory query may be used at all.
    pub enabled: bool,
    /// API key for the hosted model. Without it every query falls back.
    pub api_key: Option<String>,
    /// Model name.
    pub model: String,
    /// Base URL of the generative language API.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            max_background_edge: 1000,
            background_quality: 50,
            example_quality: 60,
            overlay_width: 800,
            overlay_height: 600,
        }
    }
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
        }
    }
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 30,
            temperature: 0.4,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("GUARDIAN_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.plan.max_background_edge == 0 {
            return Err(validation("max_background_edge must be greater than 0"));
        }

        for (name, quality) in [
            ("background_quality", self.plan.background_quality),
            ("example_quality", self.plan.example_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(validation(format!(
                    "{name} must be between 1 and 100, got {quality}"
                )));
            }
        }

        if self.plan.overlay_width == 0 || self.plan.overlay_height == 0 {
            return Err(validation("overlay dimensions must be greater than 0"));
        }

        if self.drills.tick_interval_ms == 0 {
            return Err(validation("tick_interval_ms must be greater than 0"));
        }

        if !(0.0..=2.0).contains(&self.advisory.temperature) {
            return Err(validation(format!(
                "temperature must be between 0 and 2, got {}",
                self.advisory.temperature
            )));
        }

        if self.advisory.timeout_secs == 0 {
            return Err(validation("timeout_secs must be greater than 0"));
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the drill tick interval as a Duration.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.drills.tick_interval_ms)
    }
}

fn validation(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}
