//! Order Execution record.
//!
//! One row per fill per side. Immutable apart from the settlement flag.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::errors::OrderError;
use crate::domain::shared::{ExecutionId, Lots, Money, OrderId, Timestamp};

/// Parameters of a freshly recorded execution.
#[derive(Debug, Clone)]
pub struct NewExecution {
    /// Storage identity.
    pub id: ExecutionId,
    /// Order this execution belongs to.
    pub order_id: OrderId,
    /// Lots executed.
    pub lots: Lots,
    /// Execution price.
    pub price: Money,
    /// Price reserved at order time.
    pub locked_price: Money,
    /// Commission charged.
    pub commission: Money,
    /// When the fill happened.
    pub executed_at: Timestamp,
    /// Business date on which the trade settles.
    pub settlement_date: NaiveDate,
}

/// A recorded fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExecution {
    id: ExecutionId,
    order_id: OrderId,
    lots: Lots,
    price: Money,
    locked_price: Money,
    commission: Money,
    executed_at: Timestamp,
    settlement_date: NaiveDate,
    is_settled: bool,
    settled_at: Option<Timestamp>,
}

impl OrderExecution {
    /// Record an unsettled execution.
    #[must_use]
    pub const fn new(params: NewExecution) -> Self {
        Self {
            id: params.id,
            order_id: params.order_id,
            lots: params.lots,
            price: params.price,
            locked_price: params.locked_price,
            commission: params.commission,
            executed_at: params.executed_at,
            settlement_date: params.settlement_date,
            is_settled: false,
            settled_at: None,
        }
    }

    /// Execution ID.
    #[must_use]
    pub const fn id(&self) -> ExecutionId {
        self.id
    }

    /// Owning order.
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Lots executed.
    #[must_use]
    pub const fn lots(&self) -> Lots {
        self.lots
    }

    /// Execution price.
    #[must_use]
    pub const fn price(&self) -> Money {
        self.price
    }

    /// Price reserved when the order was placed.
    #[must_use]
    pub const fn locked_price(&self) -> Money {
        self.locked_price
    }

    /// Commission charged on this execution.
    #[must_use]
    pub const fn commission(&self) -> Money {
        self.commission
    }

    /// Fill timestamp.
    #[must_use]
    pub const fn executed_at(&self) -> Timestamp {
        self.executed_at
    }

    /// Settlement date.
    #[must_use]
    pub const fn settlement_date(&self) -> NaiveDate {
        self.settlement_date
    }

    /// Whether settlement has moved the money.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.is_settled
    }

    /// When settlement happened.
    #[must_use]
    pub const fn settled_at(&self) -> Option<Timestamp> {
        self.settled_at
    }

    /// Price times lots.
    #[must_use]
    pub fn gross_amount(&self) -> Money {
        self.price.times_lots(self.lots)
    }

    /// Cash taken from a buyer at settlement.
    #[must_use]
    pub fn buy_settlement_debit(&self) -> Money {
        self.gross_amount() + self.commission
    }

    /// Cash paid to a seller at settlement.
    #[must_use]
    pub fn sell_settlement_credit(&self) -> Money {
        self.gross_amount() - self.commission
    }

    /// Flip the settled flag.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySettled` on a second call.
    pub fn mark_settled(&mut self, now: Timestamp) -> Result<(), OrderError> {
        if self.is_settled {
            return Err(OrderError::AlreadySettled {
                execution_id: self.id,
            });
        }
        self.is_settled = true;
        self.settled_at = Some(now);
        Ok(())
    }
}
