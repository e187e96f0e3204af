//! Lot quantity value object.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

use crate::domain::shared::DomainError;

/// A whole number of tradable lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lots(u32);

impl Lots {
    /// No lots.
    pub const ZERO: Self = Self(0);

    /// Create a lot quantity.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw lot count.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Returns true for zero lots.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Lot count as a Decimal, for price arithmetic.
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Subtract, returning `None` on underflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Subtract, clamping at zero.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Require a strictly positive lot amount.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` for zero lots.
    pub fn ensure_positive(&self, field: &str) -> Result<(), DomainError> {
        if self.0 == 0 {
            Err(DomainError::invalid_value(field, "must be at least one lot"))
        } else {
            Ok(())
        }
    }
}

impl Add for Lots {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Lots {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Lots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Lots {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
