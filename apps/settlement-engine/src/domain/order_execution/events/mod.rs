//! Order Events
//!
//! Published after the unit of work that produced them commits.
//! Delivery is at-least-once; consumers must tolerate duplicates.

use serde::{Deserialize, Serialize};

use crate::domain::order_execution::value_objects::{OrderSide, OrderStatus};
use crate::domain::shared::{AssetId, CustomerId, Lots, Money, OrderId, Timestamp};

/// Emitted once per recorded execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExecutedEvent {
    /// Executed order.
    pub order_id: OrderId,
    /// Order owner.
    pub customer_id: CustomerId,
    /// Owner's customer code.
    pub customer_code: String,
    /// Traded asset.
    pub asset_id: AssetId,
    /// Exchange code of the asset.
    pub bist_code: String,
    /// Order side.
    pub transaction_type: OrderSide,
    /// Status after the fill.
    pub new_status: OrderStatus,
    /// Lots in this execution.
    pub executed_lots: Lots,
    /// Execution price.
    pub executed_price: Money,
    /// Commission on this execution.
    pub commission_amount: Money,
    /// Lots still open after the fill.
    pub remaining_lots: Lots,
    /// When the execution was recorded.
    pub event_timestamp: Timestamp,
}

/// Emitted once per cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    /// Cancelled order.
    pub order_id: OrderId,
    /// Order owner.
    pub customer_id: CustomerId,
    /// Traded asset.
    pub asset_id: AssetId,
    /// Exchange code of the asset.
    pub bist_code: String,
    /// Order side.
    pub transaction_type: OrderSide,
    /// Always CANCELLED.
    pub new_status: OrderStatus,
    /// Unfilled lots released by the cancellation.
    pub cancelled_lots: Lots,
    /// When the cancellation committed.
    pub event_timestamp: Timestamp,
}

/// Order lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrderEvent {
    /// An execution was recorded.
    Executed(OrderExecutedEvent),
    /// An order was cancelled.
    Cancelled(OrderCancelledEvent),
}

impl OrderEvent {
    /// Get the order ID this event relates to.
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        match self {
            Self::Executed(e) => e.order_id,
            Self::Cancelled(e) => e.order_id,
        }
    }

    /// Get when the event occurred.
    #[must_use]
    pub const fn occurred_at(&self) -> Timestamp {
        match self {
            Self::Executed(e) => e.event_timestamp,
            Self::Cancelled(e) => e.event_timestamp,
        }
    }

    /// Get the event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Executed(_) => "OrderExecuted",
            Self::Cancelled(_) => "OrderCancelled",
        }
    }
}
