//! Calendar errors.

use chrono::NaiveDate;

/// Errors from business-day arithmetic and holiday loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// A negative number of business days was requested.
    #[error("Business day count cannot be negative: {days}")]
    NegativeDayCount {
        /// Requested count.
        days: i64,
    },

    /// Walking the calendar left the representable date range or found no business days.
    #[error("No business day reachable from {from}")]
    OutOfRange {
        /// Starting date.
        from: NaiveDate,
    },

    /// The holiday store could not be read.
    #[error("Holiday store unavailable: {message}")]
    Storage {
        /// Failure description.
        message: String,
    },
}
