//! Configuration file handling and logging set-up.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::climate::ClimateTraits;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to init logging: {0}")]
    Logging(String),
}

/// Main configuration structure. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub driver: DriverConfig,

    /// Capability set offered to climate requests.
    #[serde(default)]
    pub climate: ClimateTraits,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        content.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.command_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "command_interval_ms must be greater than zero".into(),
            ));
        }

        let climate = &self.climate;
        if climate.min_temperature >= climate.max_temperature {
            return Err(ConfigError::Invalid(format!(
                "min_temperature ({}) must be below max_temperature ({})",
                climate.min_temperature, climate.max_temperature
            )));
        }
        if climate.temperature_step <= 0.0 {
            return Err(ConfigError::Invalid(
                "temperature_step must be positive".into(),
            ));
        }
        if climate.modes.is_empty() {
            return Err(ConfigError::Invalid("no climate modes configured".into()));
        }

        if !["text", "json"].contains(&self.logging.format.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log format {:?}",
                self.logging.format
            )));
        }

        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Minimum spacing between two transmitted commands.
    pub command_interval_ms: u64,
}

impl DriverConfig {
    pub fn command_interval(&self) -> Duration {
        Duration::from_millis(self.command_interval_ms)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            command_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG` when set.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Installs the global tracing subscriber. Logs go to stderr so that stdout
/// stays free for decoded output.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| ConfigError::Logging(e.to_string()))?;
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| ConfigError::Logging(e.to_string()))?;
    }

    Ok(())
}
