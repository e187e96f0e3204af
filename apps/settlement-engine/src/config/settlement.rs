//! Settlement configuration.

use serde::{Deserialize, Serialize};

use super::default_true;

/// Settlement policy and sweep schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Hold bought lots and sold proceeds until the settlement date.
    /// When off, fills move holdings and cash immediately.
    #[serde(default = "default_true")]
    pub controls_active: bool,
    /// Seconds between settlement sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            controls_active: true,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

const fn default_sweep_interval_secs() -> u64 {
    300
}
