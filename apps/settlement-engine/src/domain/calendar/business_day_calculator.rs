//! Business Day Calculator
//!
//! Weekends and cached holidays are non-business days. The holiday cache is
//! swapped wholesale on refresh, so readers may see the previous set for up
//! to one refresh interval.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};
use parking_lot::RwLock;

use super::{CalendarError, HolidayRepository};

/// Upper bound on calendar days walked in one call.
const MAX_CALENDAR_WALK: i64 = 3660;

/// Business-day arithmetic backed by an in-memory holiday cache.
#[derive(Debug, Default)]
pub struct BusinessDayCalculator {
    holidays: RwLock<HashSet<NaiveDate>>,
}

impl BusinessDayCalculator {
    /// Create a calculator with an empty holiday cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a calculator seeded with holidays.
    #[must_use]
    pub fn with_holidays(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: RwLock::new(holidays.into_iter().collect()),
        }
    }

    /// Reload the cache from the holiday store.
    ///
    /// On failure the previous cache is kept.
    pub async fn refresh<R>(&self, repository: &R) -> Result<usize, CalendarError>
    where
        R: HolidayRepository + ?Sized,
    {
        let loaded: HashSet<NaiveDate> = repository
            .find_all()
            .await?
            .into_iter()
            .map(|h| h.date)
            .collect();
        let count = loaded.len();
        *self.holidays.write() = loaded;
        tracing::info!(holidays = count, "Holiday cache refreshed");
        Ok(count)
    }

    /// Number of cached holidays.
    #[must_use]
    pub fn holiday_count(&self) -> usize {
        self.holidays.read().len()
    }

    /// False on Saturday, Sunday, or a cached holiday.
    #[must_use]
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
            && !self.holidays.read().contains(&date)
    }

    /// The date `days` business days after `date`. Zero returns `date`.
    pub fn business_day_after(&self, date: NaiveDate, days: i64) -> Result<NaiveDate, CalendarError> {
        self.walk(date, days, NaiveDate::succ_opt)
    }

    /// The date `days` business days before `date`. Zero returns `date`.
    pub fn business_day_before(
        &self,
        date: NaiveDate,
        days: i64,
    ) -> Result<NaiveDate, CalendarError> {
        self.walk(date, days, NaiveDate::pred_opt)
    }

    fn walk(
        &self,
        date: NaiveDate,
        days: i64,
        step: fn(&NaiveDate) -> Option<NaiveDate>,
    ) -> Result<NaiveDate, CalendarError> {
        if days < 0 {
            return Err(CalendarError::NegativeDayCount { days });
        }

        let holidays = self.holidays.read();
        let mut current = date;
        let mut counted = 0;
        let mut walked = 0;
        while counted < days {
            current = step(&current).ok_or(CalendarError::OutOfRange { from: date })?;
            walked += 1;
            if walked > MAX_CALENDAR_WALK + days {
                return Err(CalendarError::OutOfRange { from: date });
            }
            let weekend = matches!(current.weekday(), Weekday::Sat | Weekday::Sun);
            if !weekend && !holidays.contains(&current) {
                counted += 1;
            }
        }
        Ok(current)
    }
}
