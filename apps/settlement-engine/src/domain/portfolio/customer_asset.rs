//! Customer asset holding.
//!
//! Invariant: `0 <= blocked_lots <= total_lots` after every operation.

use serde::{Deserialize, Serialize};

use super::LedgerError;
use crate::domain::shared::{AssetId, CustomerId, Lots, Money};

/// Lots of one asset held by one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAsset {
    customer_id: CustomerId,
    asset_id: AssetId,
    total_lots: Lots,
    blocked_lots: Lots,
    average_cost: Money,
    version: u64,
}

impl CustomerAsset {
    /// A holding with nothing in it yet.
    #[must_use]
    pub const fn empty(customer_id: CustomerId, asset_id: AssetId) -> Self {
        Self {
            customer_id,
            asset_id,
            total_lots: Lots::ZERO,
            blocked_lots: Lots::ZERO,
            average_cost: Money::ZERO,
            version: 0,
        }
    }

    /// A holding seeded with settled lots.
    #[must_use]
    pub const fn with_lots(
        customer_id: CustomerId,
        asset_id: AssetId,
        lots: Lots,
        average_cost: Money,
    ) -> Self {
        Self {
            customer_id,
            asset_id,
            total_lots: lots,
            blocked_lots: Lots::ZERO,
            average_cost,
            version: 0,
        }
    }

    /// Holder.
    #[must_use]
    pub const fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Held asset.
    #[must_use]
    pub const fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    /// All lots, blocked or not.
    #[must_use]
    pub const fn total_lots(&self) -> Lots {
        self.total_lots
    }

    /// Lots reserved for sells or awaiting buy settlement.
    #[must_use]
    pub const fn blocked_lots(&self) -> Lots {
        self.blocked_lots
    }

    /// Lots free to sell.
    #[must_use]
    pub const fn available_lots(&self) -> Lots {
        self.total_lots.saturating_sub(self.blocked_lots)
    }

    /// Weighted average purchase price.
    #[must_use]
    pub const fn average_cost(&self) -> Money {
        self.average_cost
    }

    /// Optimistic concurrency version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// True when nothing is held.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_lots.is_zero()
    }

    /// Reserve free lots for a sell order.
    pub fn block(&mut self, lots: Lots) -> Result<(), LedgerError> {
        Self::validate(lots, "block_lots")?;
        let available = self.available_lots();
        if available < lots {
            return Err(LedgerError::InsufficientAvailableAsset {
                customer_id: self.customer_id,
                asset_id: self.asset_id,
                required: lots,
                available,
            });
        }
        self.blocked_lots = self.blocked_lots + lots;
        Ok(())
    }

    /// Release up to `lots` blocked lots; returns what was released.
    pub fn unblock(&mut self, lots: Lots) -> Result<Lots, LedgerError> {
        Self::validate(lots, "unblock_lots")?;
        let released = lots.min(self.blocked_lots);
        self.blocked_lots = self.blocked_lots.saturating_sub(released);
        Ok(released)
    }

    /// Release everything blocked.
    pub const fn unblock_all(&mut self) -> Lots {
        let released = self.blocked_lots;
        self.blocked_lots = Lots::ZERO;
        released
    }

    /// Add bought lots, re-weighting the average cost.
    ///
    /// With `pending` the lots stay blocked until settlement.
    pub fn receive(&mut self, lots: Lots, price: Money, pending: bool) -> Result<(), LedgerError> {
        Self::validate(lots, "received_lots")?;
        let new_total = self.total_lots + lots;
        let cost = self.average_cost.times_lots(self.total_lots) + price.times_lots(lots);
        self.average_cost = Money::new(cost.amount() / new_total.as_decimal()).round_ledger();
        self.total_lots = new_total;
        if pending {
            self.blocked_lots = self.blocked_lots + lots;
        }
        Ok(())
    }

    /// Remove sold lots out of the blocked portion.
    pub fn deliver(&mut self, lots: Lots) -> Result<(), LedgerError> {
        Self::validate(lots, "delivered_lots")?;
        if self.blocked_lots < lots {
            return Err(LedgerError::InsufficientBlockedAsset {
                customer_id: self.customer_id,
                asset_id: self.asset_id,
                required: lots,
                blocked: self.blocked_lots,
            });
        }
        self.blocked_lots = self.blocked_lots.saturating_sub(lots);
        self.total_lots = self.total_lots.saturating_sub(lots);
        Ok(())
    }

    /// Advance the version after a successful compare-and-swap write.
    ///
    /// Called by storage adapters only.
    pub const fn advance_version(&mut self) {
        self.version += 1;
    }

    fn validate(lots: Lots, field: &str) -> Result<(), LedgerError> {
        lots.ensure_positive(field)
            .map_err(|e| LedgerError::invalid_amount(&e, field))
    }
}
