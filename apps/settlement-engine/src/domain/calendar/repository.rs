//! Holiday Repository Port
//!
//! Read-only store of market holidays.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::CalendarError;

/// A date on which the market is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// Closed date.
    pub date: NaiveDate,
    /// Human-readable name.
    pub description: String,
}

/// Port for loading the holiday calendar.
#[async_trait]
pub trait HolidayRepository: Send + Sync {
    /// Load every known holiday.
    async fn find_all(&self) -> Result<Vec<Holiday>, CalendarError>;
}
