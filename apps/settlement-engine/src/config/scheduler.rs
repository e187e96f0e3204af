//! Background task schedules.

use serde::{Deserialize, Serialize};

use super::default_true;

/// Holiday calendar refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Seconds between holiday reloads.
    #[serde(default = "default_holiday_refresh_interval_secs")]
    pub holiday_refresh_interval_secs: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            holiday_refresh_interval_secs: default_holiday_refresh_interval_secs(),
        }
    }
}

/// End-of-day open order cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Cancel open orders after the session closes.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between checks for the session close.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: default_check_interval_secs(),
        }
    }
}

/// Activation of orders queued outside session hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationConfig {
    /// Seconds between checks for the session open.
    #[serde(default = "default_activation_interval_secs")]
    pub check_interval_secs: u64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_activation_interval_secs(),
        }
    }
}

const fn default_holiday_refresh_interval_secs() -> u64 {
    86_400
}

const fn default_check_interval_secs() -> u64 {
    60
}

const fn default_activation_interval_secs() -> u64 {
    30
}
