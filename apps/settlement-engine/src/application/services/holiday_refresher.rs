//! Holiday Cache Refresher
//!
//! Loads the holiday calendar at startup and reloads it on an interval.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::calendar::{BusinessDayCalculator, HolidayRepository};

/// Background reload of the business-day calendar.
pub struct HolidayCacheRefresher<H>
where
    H: HolidayRepository,
{
    calendar: Arc<BusinessDayCalculator>,
    repository: Arc<H>,
    every: Duration,
}

impl<H> HolidayCacheRefresher<H>
where
    H: HolidayRepository,
{
    /// Create a refresher.
    pub const fn new(calendar: Arc<BusinessDayCalculator>, repository: Arc<H>, every: Duration) -> Self {
        Self {
            calendar,
            repository,
            every,
        }
    }

    /// Reload once. Failures keep the current cache.
    pub async fn refresh_once(&self) -> bool {
        match self.calendar.refresh(self.repository.as_ref()).await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    error = %e,
                    cached = self.calendar.holiday_count(),
                    "Holiday refresh failed, keeping previous cache"
                );
                false
            }
        }
    }

    /// Refresh now and then on every interval until `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(interval_secs = self.every.as_secs(), "Starting holiday cache refresher");

        let mut interval = tokio::time::interval(self.every);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.refresh_once().await;
                }
                () = shutdown.cancelled() => {
                    info!("Holiday cache refresher shutting down");
                    break;
                }
            }
        }
    }
}
