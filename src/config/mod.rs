//! Configuration management for campusnet
//!
//! This module loads and validates configuration from environment variables
//! and TOML files. Command-line flags are applied on top by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::coordinator::config::CoordinatorConfig;
use crate::worker::config::WorkerConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Coordinator service
    pub coordinator: CoordinatorConfig,

    /// Worker service
    pub worker: WorkerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl LoggingConfig {
    const LEVELS: [&'static str; 5] = ["trace", "debug", "info", "warn", "error"];
    const FORMATS: [&'static str; 2] = ["text", "json"];

    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: std::env::var("CAMPUSNET_LOG_LEVEL").unwrap_or(defaults.level),
            format: std::env::var("CAMPUSNET_LOG_FORMAT").unwrap_or(defaults.format),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !Self::LEVELS.contains(&self.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log level: {}", self.level);
        }
        if !Self::FORMATS.contains(&self.format.as_str()) {
            anyhow::bail!("Invalid log format: {} (expected text or json)", self.format);
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            coordinator: CoordinatorConfig::from_env()
                .context("Invalid coordinator environment")?,
            worker: WorkerConfig::from_env().context("Invalid worker environment")?,
            logging: LoggingConfig::from_env(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    ///
    /// Sections and fields missing from the file keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.coordinator
            .validate()
            .context("Invalid coordinator configuration")?;
        self.worker
            .validate()
            .context("Invalid worker configuration")?;
        self.logging.validate()?;
        Ok(())
    }
}
