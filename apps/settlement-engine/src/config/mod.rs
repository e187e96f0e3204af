//! Configuration module for the settlement engine.
//!
//! Loads `config.yaml`, interpolates environment variables, and validates
//! the result before anything is wired.
//!
//! # Usage
//!
//! ```rust,ignore
//! use settlement_engine::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! let hours = config.trading.session_hours()?;
//! println!("sweep every {}s", config.settlement.sweep_interval_secs);
//! ```

mod logging;
mod scheduler;
mod settlement;
mod trading;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use logging::{LogFormat, LoggingConfig};
pub use scheduler::{ActivationConfig, CalendarConfig, CleanupConfig};
pub use settlement::SettlementConfig;
pub use trading::TradingConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Trading session configuration.
    #[serde(default)]
    pub trading: TradingConfig,
    /// Settlement policy and sweep schedule.
    #[serde(default)]
    pub settlement: SettlementConfig,
    /// Holiday calendar refresh.
    #[serde(default)]
    pub calendar: CalendarConfig,
    /// End-of-day cleanup.
    #[serde(default)]
    pub cleanup: CleanupConfig,
    /// Session-open activation of queued orders.
    #[serde(default)]
    pub activation: ActivationConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

pub(crate) const fn default_true() -> bool {
    true
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// `path` defaults to `config.yaml`.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is a constant pattern
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let trading = &config.trading;

    if !(-12..=14).contains(&trading.timezone_offset_hours) {
        return Err(ConfigError::ValidationError(
            "trading.timezone_offset_hours must be between -12 and 14".to_string(),
        ));
    }

    let hours = trading.session_hours()?;
    if hours.open >= hours.close {
        return Err(ConfigError::ValidationError(
            "trading.session_open must be before trading.session_close".to_string(),
        ));
    }

    if trading.max_match_rounds == 0 {
        return Err(ConfigError::ValidationError(
            "trading.max_match_rounds must be positive".to_string(),
        ));
    }

    let intervals = [
        ("settlement.sweep_interval_secs", config.settlement.sweep_interval_secs),
        (
            "calendar.holiday_refresh_interval_secs",
            config.calendar.holiday_refresh_interval_secs,
        ),
        ("cleanup.check_interval_secs", config.cleanup.check_interval_secs),
        (
            "activation.check_interval_secs",
            config.activation.check_interval_secs,
        ),
    ];
    if let Some((name, _)) = intervals.iter().find(|(_, secs)| *secs == 0) {
        return Err(ConfigError::ValidationError(format!("{name} must be positive")));
    }

    config.logging.validate()
}
