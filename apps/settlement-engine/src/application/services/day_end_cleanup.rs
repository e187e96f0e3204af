//! Day-End Order Cleanup
//!
//! Once per business day, after the session closes, every order still queued
//! or open is cancelled and its reservation released.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::MarketSession;
use crate::application::ports::{ClockPort, EventPublisherPort, LivePricePort, UnitOfWork};
use crate::application::use_cases::OrderService;
use crate::domain::brokerage::BrokerageFirmRepository;

/// Outcome of one cleanup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayEndReport {
    /// Orders cancelled.
    pub cancelled: usize,
    /// Orders that could not be cancelled and were marked FAILED.
    pub failed: usize,
}

/// Background cancel of open orders after the close.
pub struct DayEndOrderCleanup<U, E, P, R, C>
where
    U: UnitOfWork,
    E: EventPublisherPort,
    P: LivePricePort,
    R: BrokerageFirmRepository,
    C: ClockPort,
{
    orders: Arc<OrderService<U, E, P, R, C>>,
    session: Arc<MarketSession>,
    clock: Arc<C>,
    last_run: Mutex<Option<NaiveDate>>,
}

impl<U, E, P, R, C> DayEndOrderCleanup<U, E, P, R, C>
where
    U: UnitOfWork,
    E: EventPublisherPort,
    P: LivePricePort,
    R: BrokerageFirmRepository,
    C: ClockPort,
{
    /// Create the cleanup task.
    pub const fn new(
        orders: Arc<OrderService<U, E, P, R, C>>,
        session: Arc<MarketSession>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            orders,
            session,
            clock,
            last_run: Mutex::new(None),
        }
    }

    /// Run the cleanup if `now` is after the close of a business day that
    /// has not been cleaned yet.
    pub async fn run_if_due(&self, now: DateTime<Utc>) -> Option<DayEndReport> {
        let today = self.session.local_date(now);
        if !self.session.is_business_day(now) || !self.session.is_after_close(now) {
            return None;
        }
        if *self.last_run.lock() == Some(today) {
            return None;
        }

        match self.orders.cancel_open_orders().await {
            Ok(report) => {
                *self.last_run.lock() = Some(today);
                info!(
                    date = %today,
                    cancelled = report.cancelled,
                    failed = report.failed,
                    "Day-end cleanup finished"
                );
                Some(report)
            }
            Err(e) => {
                error!(date = %today, error = %e, "Day-end cleanup aborted");
                None
            }
        }
    }

    /// Check every `every` until `shutdown` fires.
    pub async fn run(&self, every: Duration, shutdown: CancellationToken) {
        info!(interval_secs = every.as_secs(), "Starting day-end order cleanup");

        let mut interval = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_if_due(self.clock.now()).await;
                }
                () = shutdown.cancelled() => {
                    info!("Day-end order cleanup shutting down");
                    break;
                }
            }
        }
    }
}
