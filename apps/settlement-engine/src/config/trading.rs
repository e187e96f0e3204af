//! Trading session configuration.

use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::application::services::SessionHours;

/// Trading session and matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Exchange offset from UTC, in whole hours.
    #[serde(default = "default_timezone_offset_hours")]
    pub timezone_offset_hours: i32,
    /// Session open, exchange-local `HH:MM`.
    #[serde(default = "default_session_open")]
    pub session_open: String,
    /// Session close, exchange-local `HH:MM`.
    #[serde(default = "default_session_close")]
    pub session_close: String,
    /// Accept orders outside session hours.
    #[serde(default)]
    pub trading_override: bool,
    /// Settlement offset for assets seeded without one.
    #[serde(default = "default_settlement_days")]
    pub default_settlement_days: u32,
    /// Upper bound on matching passes per incoming order.
    #[serde(default = "default_max_match_rounds")]
    pub max_match_rounds: usize,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            timezone_offset_hours: default_timezone_offset_hours(),
            session_open: default_session_open(),
            session_close: default_session_close(),
            trading_override: false,
            default_settlement_days: default_settlement_days(),
            max_match_rounds: default_max_match_rounds(),
        }
    }
}

impl TradingConfig {
    /// Parsed session window.
    pub fn session_hours(&self) -> Result<SessionHours, ConfigError> {
        let utc_offset = FixedOffset::east_opt(self.timezone_offset_hours * 3600).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "trading.timezone_offset_hours out of range: {}",
                self.timezone_offset_hours
            ))
        })?;
        let open = parse_time("trading.session_open", &self.session_open)?;
        let close = parse_time("trading.session_close", &self.session_close)?;
        Ok(SessionHours {
            utc_offset,
            open,
            close,
        })
    }
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| ConfigError::ValidationError(format!("{field} '{value}' is not HH:MM: {e}")))
}

const fn default_timezone_offset_hours() -> i32 {
    3
}

fn default_session_open() -> String {
    "09:55".to_string()
}

fn default_session_close() -> String {
    "18:05".to_string()
}

const fn default_settlement_days() -> u32 {
    2
}

const fn default_max_match_rounds() -> usize {
    16
}
