//! Order Aggregate Root
//!
//! The Order aggregate owns the lot quantities, the reserved price and the
//! lifecycle status of one customer order. Every status change is checked
//! against the `OrderStateMachine` transition table.

use serde::{Deserialize, Serialize};

use crate::domain::order_execution::errors::OrderError;
use crate::domain::order_execution::services::OrderStateMachine;
use crate::domain::order_execution::value_objects::{
    OrderSide, OrderStatus, OrderType, tick_size,
};
use crate::domain::shared::{
    AccountId, AssetId, BatchId, CustomerId, Lots, Money, OrderCode, OrderId, Timestamp,
};

/// Command to create a new order.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    /// Bulk request this order belongs to.
    pub batch_id: BatchId,
    /// Account that pays or delivers.
    pub customer_account_id: AccountId,
    /// Owner of the account.
    pub customer_id: CustomerId,
    /// Asset being traded.
    pub asset_id: AssetId,
    /// Buy or sell.
    pub side: OrderSide,
    /// Limit or market.
    pub order_type: OrderType,
    /// Lots requested.
    pub lots: Lots,
    /// Limit price for LIMIT orders, live reference price for MARKET orders.
    pub price: Money,
    /// Operator who entered the order.
    pub created_by: Option<String>,
}

impl CreateOrderCommand {
    /// Validate the command parameters.
    ///
    /// # Errors
    ///
    /// Returns error if the lot amount or price is invalid.
    pub fn validate(&self) -> Result<(), OrderError> {
        self.lots
            .ensure_positive("lot_amount")
            .map_err(|e| OrderError::InvalidParameters {
                field: "lot_amount".to_string(),
                message: e.to_string(),
            })?;

        self.price
            .ensure_positive("limit_price")
            .map_err(|e| OrderError::InvalidParameters {
                field: "limit_price".to_string(),
                message: e.to_string(),
            })?;

        if self.order_type.requires_limit_price() {
            tick_size::validate_tick(self.price)?;
        }

        Ok(())
    }
}

/// Order Aggregate Root.
#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    code: OrderCode,
    batch_id: BatchId,
    customer_account_id: AccountId,
    customer_id: CustomerId,
    asset_id: AssetId,
    side: OrderSide,
    order_type: OrderType,
    status: OrderStatus,
    initial_lots: Lots,
    filled_lots: Lots,
    price: Money,
    status_reason: Option<String>,
    created_by: Option<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
    version: u64,
}

impl Order {
    /// Create a new QUEUED order from a command.
    ///
    /// # Errors
    ///
    /// Returns error if command validation fails.
    pub fn new(id: OrderId, cmd: CreateOrderCommand, now: Timestamp) -> Result<Self, OrderError> {
        cmd.validate()?;

        Ok(Self {
            id,
            code: OrderCode::generate(),
            batch_id: cmd.batch_id,
            customer_account_id: cmd.customer_account_id,
            customer_id: cmd.customer_id,
            asset_id: cmd.asset_id,
            side: cmd.side,
            order_type: cmd.order_type,
            status: OrderStatus::Queued,
            initial_lots: cmd.lots,
            filled_lots: Lots::ZERO,
            price: cmd.price,
            status_reason: None,
            created_by: cmd.created_by,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Get the order ID.
    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    /// Get the external order code.
    #[must_use]
    pub const fn code(&self) -> &OrderCode {
        &self.code
    }

    /// Get the batch this order was submitted with.
    #[must_use]
    pub const fn batch_id(&self) -> &BatchId {
        &self.batch_id
    }

    /// Get the paying/delivering account.
    #[must_use]
    pub const fn customer_account_id(&self) -> AccountId {
        self.customer_account_id
    }

    /// Get the customer.
    #[must_use]
    pub const fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Get the asset.
    #[must_use]
    pub const fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    /// Get the order side.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Get the order type.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Lots originally requested (or amended to).
    #[must_use]
    pub const fn initial_lots(&self) -> Lots {
        self.initial_lots
    }

    /// Lots executed so far.
    #[must_use]
    pub const fn filled_lots(&self) -> Lots {
        self.filled_lots
    }

    /// Lots still open.
    #[must_use]
    pub const fn remaining_lots(&self) -> Lots {
        self.initial_lots.saturating_sub(self.filled_lots)
    }

    /// The client limit price, present for LIMIT orders only.
    #[must_use]
    pub const fn limit_price(&self) -> Option<Money> {
        match self.order_type {
            OrderType::Limit => Some(self.price),
            OrderType::Market => None,
        }
    }

    /// Price the reservation was made at: the limit price, or the live
    /// price at intake for MARKET orders.
    #[must_use]
    pub const fn locked_price(&self) -> Money {
        self.price
    }

    /// Why the order was rejected or failed.
    #[must_use]
    pub fn status_reason(&self) -> Option<&str> {
        self.status_reason.as_deref()
    }

    /// Operator who entered the order.
    #[must_use]
    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    /// Get creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Get last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Optimistic concurrency version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns true if the order rests in the book.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.status.is_open()
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Reservation succeeded; the order enters the book.
    ///
    /// # Errors
    ///
    /// Returns error if the order is not QUEUED.
    pub fn activate(&mut self, now: Timestamp) -> Result<(), OrderError> {
        self.transition(OrderStatus::Active, now)
    }

    /// Reservation failed at intake.
    ///
    /// # Errors
    ///
    /// Returns error if the order is not QUEUED.
    pub fn reject(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), OrderError> {
        self.transition(OrderStatus::Rejected, now)?;
        self.status_reason = Some(reason.into());
        Ok(())
    }

    /// Cancel the open remainder.
    ///
    /// # Errors
    ///
    /// Returns `NotCancellable` unless the order is QUEUED, ACTIVE or
    /// PARTIALLY_FILLED.
    pub fn cancel(&mut self, now: Timestamp) -> Result<Lots, OrderError> {
        if !self.status.is_cancellable() {
            return Err(OrderError::NotCancellable {
                status: self.status,
            });
        }
        let cancelled = self.remaining_lots();
        self.transition(OrderStatus::Cancelled, now)?;
        Ok(cancelled)
    }

    /// Mark processing as failed.
    ///
    /// # Errors
    ///
    /// Returns error if the order is already terminal.
    pub fn fail(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), OrderError> {
        self.transition(OrderStatus::Failed, now)?;
        self.status_reason = Some(reason.into());
        Ok(())
    }

    /// Record an execution of `lots`.
    ///
    /// Moves to FILLED when nothing remains, otherwise PARTIALLY_FILLED.
    ///
    /// # Errors
    ///
    /// Returns error on zero lots, overfill, or a non-open status.
    pub fn apply_fill(&mut self, lots: Lots, now: Timestamp) -> Result<OrderStatus, OrderError> {
        lots.ensure_positive("executed_lots")
            .map_err(|e| OrderError::InvalidParameters {
                field: "executed_lots".to_string(),
                message: e.to_string(),
            })?;

        let remaining = self.remaining_lots();
        if lots > remaining {
            return Err(OrderError::Overfill {
                requested: lots,
                remaining,
            });
        }

        let filled = self.filled_lots + lots;
        let next = if filled == self.initial_lots {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.transition(next, now)?;
        self.filled_lots = filled;
        Ok(next)
    }

    /// Amend price, type or quantity of a resting order.
    ///
    /// # Errors
    ///
    /// Returns error if the order is not open, the new quantity is below the
    /// filled amount, or the new price fails validation.
    pub fn amend(
        &mut self,
        order_type: OrderType,
        price: Money,
        lots: Lots,
        now: Timestamp,
    ) -> Result<(), OrderError> {
        if !self.status.is_updatable() {
            return Err(OrderError::NotUpdatable {
                status: self.status,
            });
        }
        if lots <= self.filled_lots {
            return Err(OrderError::LotsBelowFilled {
                requested: lots,
                filled: self.filled_lots,
            });
        }
        price
            .ensure_positive("limit_price")
            .map_err(|e| OrderError::InvalidParameters {
                field: "limit_price".to_string(),
                message: e.to_string(),
            })?;
        if order_type.requires_limit_price() {
            tick_size::validate_tick(price)?;
        }

        self.order_type = order_type;
        self.price = price;
        self.initial_lots = lots;
        self.updated_at = now;
        Ok(())
    }

    /// Advance the version after a successful compare-and-swap write.
    ///
    /// Called by storage adapters only.
    pub const fn advance_version(&mut self) {
        self.version += 1;
    }

    fn transition(&mut self, to: OrderStatus, now: Timestamp) -> Result<(), OrderError> {
        OrderStateMachine::validate_transition(self.status, to)?;
        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_command(side: OrderSide, lots: u32, price: Money) -> CreateOrderCommand {
        CreateOrderCommand {
            batch_id: BatchId::new("batch-1"),
            customer_account_id: AccountId::new(1),
            customer_id: CustomerId::new(1),
            asset_id: AssetId::new(1),
            side,
            order_type: OrderType::Limit,
            lots: Lots::new(lots),
            price,
            created_by: None,
        }
    }

    fn make_active_order(lots: u32) -> Order {
        let mut order = Order::new(
            OrderId::new(1),
            make_command(OrderSide::Buy, lots, Money::new(dec!(10.00))),
            Timestamp::now(),
        )
        .unwrap();
        order.activate(Timestamp::now()).unwrap();
        order
    }

    // ========================================================================
    // Creation
    // ========================================================================

    #[test]
    fn new_order_is_queued() {
        let order = Order::new(
            OrderId::new(7),
            make_command(OrderSide::Sell, 10, Money::new(dec!(19.99))),
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(order.status(), OrderStatus::Queued);
        assert_eq!(order.remaining_lots(), Lots::new(10));
        assert_eq!(order.version(), 0);
        assert_eq!(order.limit_price(), Some(Money::new(dec!(19.99))));
    }

    #[test]
    fn off_tick_limit_is_rejected() {
        let result = Order::new(
            OrderId::new(1),
            make_command(OrderSide::Buy, 10, Money::new(dec!(19.995))),
            Timestamp::now(),
        );
        assert!(matches!(result, Err(OrderError::InvalidTickSize { .. })));
    }

    #[test]
    fn market_order_skips_tick_check() {
        let mut cmd = make_command(OrderSide::Buy, 10, Money::new(dec!(19.995)));
        cmd.order_type = OrderType::Market;
        let order = Order::new(OrderId::new(1), cmd, Timestamp::now()).unwrap();
        assert_eq!(order.limit_price(), None);
        assert_eq!(order.locked_price(), Money::new(dec!(19.995)));
    }

    #[test]
    fn zero_lots_rejected() {
        let result = Order::new(
            OrderId::new(1),
            make_command(OrderSide::Buy, 0, Money::new(dec!(10))),
            Timestamp::now(),
        );
        assert!(matches!(result, Err(OrderError::InvalidParameters { .. })));
    }

    // ========================================================================
    // Fills
    // ========================================================================

    #[test]
    fn partial_then_full_fill() {
        let mut order = make_active_order(100);

        let status = order.apply_fill(Lots::new(60), Timestamp::now()).unwrap();
        assert_eq!(status, OrderStatus::PartiallyFilled);
        assert_eq!(order.remaining_lots(), Lots::new(40));

        let status = order.apply_fill(Lots::new(40), Timestamp::now()).unwrap();
        assert_eq!(status, OrderStatus::Filled);
        assert_eq!(order.filled_lots(), order.initial_lots());
    }

    #[test]
    fn overfill_is_refused() {
        let mut order = make_active_order(10);
        let err = order.apply_fill(Lots::new(11), Timestamp::now()).unwrap_err();
        assert!(matches!(err, OrderError::Overfill { .. }));
        assert_eq!(order.filled_lots(), Lots::ZERO);
    }

    #[test]
    fn queued_order_cannot_fill() {
        let mut order = Order::new(
            OrderId::new(1),
            make_command(OrderSide::Buy, 10, Money::new(dec!(10))),
            Timestamp::now(),
        )
        .unwrap();
        assert!(order.apply_fill(Lots::new(1), Timestamp::now()).is_err());
    }

    // ========================================================================
    // Cancel / amend
    // ========================================================================

    #[test]
    fn cancel_returns_remainder() {
        let mut order = make_active_order(100);
        order.apply_fill(Lots::new(30), Timestamp::now()).unwrap();
        let cancelled = order.cancel(Timestamp::now()).unwrap();
        assert_eq!(cancelled, Lots::new(70));
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn queued_order_cancels_in_full() {
        let mut order = Order::new(
            OrderId::new(1),
            make_command(OrderSide::Sell, 25, Money::new(dec!(10))),
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(order.cancel(Timestamp::now()).unwrap(), Lots::new(25));
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn filled_order_cannot_cancel() {
        let mut order = make_active_order(10);
        order.apply_fill(Lots::new(10), Timestamp::now()).unwrap();
        assert_eq!(
            order.cancel(Timestamp::now()),
            Err(OrderError::NotCancellable {
                status: OrderStatus::Filled
            })
        );
    }

    #[test]
    fn amend_below_filled_is_refused() {
        let mut order = make_active_order(100);
        order.apply_fill(Lots::new(50), Timestamp::now()).unwrap();
        let err = order
            .amend(OrderType::Limit, Money::new(dec!(10)), Lots::new(50), Timestamp::now())
            .unwrap_err();
        assert!(matches!(err, OrderError::LotsBelowFilled { .. }));
    }

    #[test]
    fn amend_updates_price_and_lots() {
        let mut order = make_active_order(100);
        order
            .amend(OrderType::Limit, Money::new(dec!(10.50)), Lots::new(120), Timestamp::now())
            .unwrap();
        assert_eq!(order.locked_price(), Money::new(dec!(10.50)));
        assert_eq!(order.initial_lots(), Lots::new(120));
    }

    #[test]
    fn reject_records_reason() {
        let mut order = Order::new(
            OrderId::new(1),
            make_command(OrderSide::Buy, 10, Money::new(dec!(10))),
            Timestamp::now(),
        )
        .unwrap();
        order.reject("insufficient balance", Timestamp::now()).unwrap();
        assert_eq!(order.status(), OrderStatus::Rejected);
        assert_eq!(order.status_reason(), Some("insufficient balance"));
    }
}
