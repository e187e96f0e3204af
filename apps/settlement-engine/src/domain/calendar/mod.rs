//! Calendar Bounded Context
//!
//! Business-day arithmetic over weekends and a cached holiday set.

pub mod business_day_calculator;
pub mod errors;
pub mod repository;

pub use business_day_calculator::BusinessDayCalculator;
pub use errors::CalendarError;
pub use repository::{Holiday, HolidayRepository};
