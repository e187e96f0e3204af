//! Money value object for currency amounts and prices.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

use super::Lots;
use crate::domain::shared::DomainError;

/// Scale used for ledger amounts (reservations, commissions, cost basis).
pub const LEDGER_SCALE: u32 = 4;

/// A monetary amount or unit price.
///
/// Represented as a Decimal for precise financial calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Money value from a Decimal.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the inner Decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if this amount is positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if this amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns true if this amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Round half-up to the ledger scale.
    #[must_use]
    pub fn round_ledger(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(LEDGER_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Price times a lot amount.
    #[must_use]
    pub fn times_lots(&self, lots: Lots) -> Self {
        Self(self.0 * lots.as_decimal())
    }

    /// Price times a lot amount, or `None` if the product is out of range.
    #[must_use]
    pub fn checked_times_lots(&self, lots: Lots) -> Option<Self> {
        self.0.checked_mul(lots.as_decimal()).map(Self)
    }

    /// Sum of two amounts, or `None` if it is out of range.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Multiply by a rate (e.g. a commission fraction).
    #[must_use]
    pub fn times_rate(&self, rate: Decimal) -> Self {
        Self(self.0 * rate)
    }

    /// Clamp a negative amount to zero.
    #[must_use]
    pub fn floor_zero(self) -> Self {
        self.max(Self::ZERO)
    }

    /// Require the amount to be strictly positive.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` for zero or negative amounts.
    pub fn ensure_positive(&self, field: &str) -> Result<(), DomainError> {
        if self.is_positive() {
            Ok(())
        } else {
            Err(DomainError::invalid_value(
                field,
                format!("must be greater than zero, got {}", self.0),
            ))
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}
