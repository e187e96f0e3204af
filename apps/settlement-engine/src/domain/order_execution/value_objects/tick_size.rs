//! Price tick-size table.
//!
//! | Price up to | Tick |
//! |-------------|------|
//! | 19.999      | 0.01 |
//! | 49.999      | 0.02 |
//! | 99.999      | 0.05 |
//! | 249.999     | 0.10 |
//! | 499.999     | 0.25 |
//! | 999.999     | 0.50 |
//! | 2499.999    | 1.00 |
//! | above       | 2.50 |

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::order_execution::errors::OrderError;
use crate::domain::shared::Money;

const BRACKETS: [(Decimal, Decimal); 7] = [
    (dec!(19.999), dec!(0.01)),
    (dec!(49.999), dec!(0.02)),
    (dec!(99.999), dec!(0.05)),
    (dec!(249.999), dec!(0.1)),
    (dec!(499.999), dec!(0.25)),
    (dec!(999.999), dec!(0.5)),
    (dec!(2499.999), dec!(1.0)),
];

const TOP_TICK: Decimal = dec!(2.5);

/// Minimum price increment for the bracket containing `price`.
#[must_use]
pub fn tick_size_for(price: Money) -> Decimal {
    BRACKETS
        .iter()
        .find(|(upper, _)| price.amount() <= *upper)
        .map_or(TOP_TICK, |(_, tick)| *tick)
}

/// True if `price` is positive and an exact multiple of its tick.
#[must_use]
pub fn is_price_tick_valid(price: Money) -> bool {
    price.is_positive() && (price.amount() % tick_size_for(price)).is_zero()
}

/// Validate a limit price against the tick table.
///
/// # Errors
///
/// Returns `OrderError::InvalidTickSize` if the price is off-tick or not positive.
pub fn validate_tick(price: Money) -> Result<(), OrderError> {
    if is_price_tick_valid(price) {
        Ok(())
    } else {
        Err(OrderError::InvalidTickSize {
            price,
            tick: tick_size_for(price),
        })
    }
}
