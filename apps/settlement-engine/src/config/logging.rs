//! Log output settings.
//!
//! The engine logs every reservation, fill and settlement, so the ledger
//! and matching modules get their own filter directives on top of the
//! base level.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::Directive;

use super::ConfigError;

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line, for the back-office log pipeline.
    #[default]
    Json,
    /// Multi-line human-readable output for local runs.
    Pretty,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Pretty => write!(f, "pretty"),
        }
    }
}

/// Logging section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level for every target. `RUST_LOG` replaces the whole filter.
    pub level: String,
    /// Output rendering.
    pub format: LogFormat,
    /// Extra `target=level` directives layered over `level`.
    pub directives: Vec<String>,
    /// Emit a record when a span closes, with its timings.
    pub span_timings: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            directives: vec![
                "settlement_engine::application::services::portfolio_ledger=info".to_string(),
                "settlement_engine::application::services::settlement_service=info".to_string(),
            ],
            span_timings: false,
        }
    }
}

impl LoggingConfig {
    /// Parse `directives` into filter directives.
    pub fn parsed_directives(&self) -> Result<Vec<Directive>, ConfigError> {
        self.directives
            .iter()
            .map(|raw| {
                raw.parse::<Directive>().map_err(|e| {
                    ConfigError::ValidationError(format!("logging.directives entry '{raw}': {e}"))
                })
            })
            .collect()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "logging.level '{}' must be one of trace, debug, info, warn, error",
                self.level
            )));
        }
        self.parsed_directives().map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_scope_the_ledger_modules() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.format, LogFormat::Json);
        assert_eq!(logging.parsed_directives().unwrap().len(), 2);
        assert!(logging.validate().is_ok());
    }

    #[test]
    fn unknown_level_is_rejected() {
        let logging = LoggingConfig {
            level: "verbose".to_string(),
            ..LoggingConfig::default()
        };
        assert!(logging.validate().unwrap_err().to_string().contains("logging.level"));
    }

    #[test]
    fn malformed_directive_is_rejected() {
        let logging = LoggingConfig {
            directives: vec!["settlement_engine=loud".to_string()],
            ..LoggingConfig::default()
        };
        assert!(logging.validate().unwrap_err().to_string().contains("directives"));
    }
}
