//! Market Session
//!
//! Decides whether orders may be entered right now: the local date must be
//! a business day and local time must fall inside the session, unless the
//! trading override is on.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::domain::calendar::BusinessDayCalculator;
use crate::error::{EngineError, ErrorCode};

/// Exchange-local session window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHours {
    /// Exchange offset from UTC.
    pub utc_offset: FixedOffset,
    /// First minute orders are accepted.
    pub open: NaiveTime,
    /// Last minute orders are accepted.
    pub close: NaiveTime,
}

/// Where a business day stands relative to the session window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Inside the window, or the override is on. Orders enter the book.
    Open,
    /// Before the open or after the close. LIMIT orders wait QUEUED.
    OutOfHours,
}

/// Trading-hours gate.
#[derive(Debug)]
pub struct MarketSession {
    hours: SessionHours,
    calendar: Arc<BusinessDayCalculator>,
    trading_override: AtomicBool,
}

impl MarketSession {
    /// Create a session gate.
    #[must_use]
    pub const fn new(
        hours: SessionHours,
        calendar: Arc<BusinessDayCalculator>,
        trading_override: bool,
    ) -> Self {
        Self {
            hours,
            calendar,
            trading_override: AtomicBool::new(trading_override),
        }
    }

    /// Session window.
    #[must_use]
    pub const fn hours(&self) -> SessionHours {
        self.hours
    }

    /// Shared business-day calendar.
    #[must_use]
    pub fn calendar(&self) -> &Arc<BusinessDayCalculator> {
        &self.calendar
    }

    /// Turn the out-of-hours override on or off.
    pub fn set_trading_override(&self, enabled: bool) {
        self.trading_override.store(enabled, Ordering::SeqCst);
        tracing::warn!(enabled, "Trading override changed");
    }

    /// Whether the out-of-hours override is on.
    pub fn trading_override(&self) -> bool {
        self.trading_override.load(Ordering::SeqCst)
    }

    /// Exchange-local wall-clock time.
    #[must_use]
    pub fn local_time(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.hours.utc_offset).naive_local()
    }

    /// Exchange-local date; trade and settlement dates use this.
    #[must_use]
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_time(now).date()
    }

    /// True on a business day.
    #[must_use]
    pub fn is_business_day(&self, now: DateTime<Utc>) -> bool {
        self.calendar.is_business_day(self.local_date(now))
    }

    /// True when local time is past the session close.
    #[must_use]
    pub fn is_after_close(&self, now: DateTime<Utc>) -> bool {
        self.local_time(now).time() > self.hours.close
    }

    /// True when orders may be entered at `now`.
    #[must_use]
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.ensure_open(now).is_ok()
    }

    /// Session phase at `now`.
    ///
    /// Fails with `MarketClosed` on a weekend or holiday, where nothing is
    /// accepted at all.
    pub fn phase(&self, now: DateTime<Utc>) -> Result<SessionPhase, EngineError> {
        let local = self.local_time(now);
        if !self.calendar.is_business_day(local.date()) {
            return Err(EngineError::validation(
                ErrorCode::MarketClosed,
                format!("non-business-day trading attempt on {}", local.date()),
            ));
        }
        if self.trading_override() {
            return Ok(SessionPhase::Open);
        }
        let time = local.time();
        if time < self.hours.open || time > self.hours.close {
            return Ok(SessionPhase::OutOfHours);
        }
        Ok(SessionPhase::Open)
    }

    /// Fail with `MarketClosed` unless the session is open at `now`.
    pub fn ensure_open(&self, now: DateTime<Utc>) -> Result<(), EngineError> {
        match self.phase(now)? {
            SessionPhase::Open => Ok(()),
            SessionPhase::OutOfHours => Err(EngineError::validation(
                ErrorCode::MarketClosed,
                format!(
                    "outside trading hours {}-{} (local time {})",
                    self.hours.open.format("%H:%M"),
                    self.hours.close.format("%H:%M"),
                    self.local_time(now).time().format("%H:%M:%S")
                ),
            )),
        }
    }
}
