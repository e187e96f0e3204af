//! Brokerage firm aggregate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::BrokerageError;
use crate::domain::shared::{FirmId, Timestamp};

/// Firm lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FirmStatus {
    /// The firm whose rate applies.
    Active,
    /// Configured but not in use.
    Inactive,
}

/// A brokerage firm and its commission rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerageFirm {
    id: FirmId,
    name: String,
    commission_rate: Decimal,
    status: FirmStatus,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl BrokerageFirm {
    /// Create an inactive firm.
    pub fn new(
        id: FirmId,
        name: impl Into<String>,
        commission_rate: Decimal,
        now: Timestamp,
    ) -> Result<Self, BrokerageError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BrokerageError::EmptyName);
        }
        validate_rate(commission_rate)?;
        Ok(Self {
            id,
            name,
            commission_rate,
            status: FirmStatus::Inactive,
            created_at: now,
            updated_at: now,
        })
    }

    /// Firm ID.
    #[must_use]
    pub const fn id(&self) -> FirmId {
        self.id
    }

    /// Firm name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Commission fraction in [0, 1].
    #[must_use]
    pub const fn commission_rate(&self) -> Decimal {
        self.commission_rate
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> FirmStatus {
        self.status
    }

    /// True if this firm's rate applies.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == FirmStatus::Active
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Change the commission rate.
    pub fn set_commission_rate(&mut self, rate: Decimal, now: Timestamp) -> Result<(), BrokerageError> {
        validate_rate(rate)?;
        self.commission_rate = rate;
        self.updated_at = now;
        Ok(())
    }

    /// Make this the active firm.
    pub fn activate(&mut self, now: Timestamp) {
        self.status = FirmStatus::Active;
        self.updated_at = now;
    }

    /// Take this firm out of use.
    pub fn deactivate(&mut self, now: Timestamp) {
        self.status = FirmStatus::Inactive;
        self.updated_at = now;
    }
}

fn validate_rate(rate: Decimal) -> Result<(), BrokerageError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(BrokerageError::InvalidCommissionRate { rate });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case(dec!(0) ; "zero")]
    #[test_case(dec!(0.001) ; "typical")]
    #[test_case(dec!(1) ; "one")]
    fn accepts_rates_in_unit_interval(rate: Decimal) {
        assert!(BrokerageFirm::new(FirmId::new(1), "Acme", rate, Timestamp::now()).is_ok());
    }

    #[test_case(dec!(-0.0001) ; "negative")]
    #[test_case(dec!(1.0001) ; "above one")]
    fn rejects_rates_outside_unit_interval(rate: Decimal) {
        let err = BrokerageFirm::new(FirmId::new(1), "Acme", rate, Timestamp::now()).unwrap_err();
        assert_eq!(err, BrokerageError::InvalidCommissionRate { rate });
    }

    #[test]
    fn new_firm_is_inactive() {
        let firm = BrokerageFirm::new(FirmId::new(1), "Acme", dec!(0.002), Timestamp::now()).unwrap();
        assert!(!firm.is_active());
    }

    #[test]
    fn blank_name_rejected() {
        assert_eq!(
            BrokerageFirm::new(FirmId::new(1), "  ", dec!(0.002), Timestamp::now()),
            Err(BrokerageError::EmptyName)
        );
    }
}
