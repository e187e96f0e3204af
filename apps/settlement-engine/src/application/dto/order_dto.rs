//! Order DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::{Order, OrderSide, OrderStatus, OrderType};
use crate::domain::shared::{AccountId, AssetId, BatchId, CustomerId, OrderId, Timestamp};

/// One customer's line in a bulk order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerOrderDto {
    /// Account that pays or delivers.
    pub customer_account_id: AccountId,
    /// Lots requested.
    pub lot_amount: u32,
}

/// Request DTO for entering the same order for many customers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkOrderRequestDto {
    /// Exchange code of the asset.
    pub bist_code: String,
    /// Side.
    pub side: OrderSide,
    /// Type.
    pub order_type: OrderType,
    /// Limit price. Ignored for MARKET orders.
    pub limit_price: Option<Decimal>,
    /// Customer lines.
    pub customer_orders: Vec<CustomerOrderDto>,
    /// Operator entering the orders.
    pub created_by: Option<String>,
}

/// Response DTO for a bulk order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkOrderResponseDto {
    /// Batch identifier shared by every order of the request.
    pub batch_id: BatchId,
    /// One order per customer line, in request order.
    pub orders: Vec<OrderDto>,
}

impl BulkOrderResponseDto {
    /// Orders that were not rejected at intake.
    pub fn accepted(&self) -> impl Iterator<Item = &OrderDto> {
        self.orders.iter().filter(|o| o.status != OrderStatus::Rejected)
    }

    /// Orders rejected at intake.
    pub fn rejected(&self) -> impl Iterator<Item = &OrderDto> {
        self.orders.iter().filter(|o| o.status == OrderStatus::Rejected)
    }
}

/// Request DTO for amending a resting order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderRequestDto {
    /// Version the caller last saw.
    pub expected_version: u64,
    /// New type.
    pub order_type: OrderType,
    /// New limit price. Ignored for MARKET orders.
    pub limit_price: Option<Decimal>,
    /// New total lot amount; must exceed the filled amount.
    pub lot_amount: u32,
}

/// Request DTO for a dry-run check of one prospective order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateLotRequestDto {
    /// Account that would pay or deliver.
    pub customer_account_id: AccountId,
    /// Exchange code of the asset.
    pub bist_code: String,
    /// Side.
    pub side: OrderSide,
    /// Type.
    pub order_type: OrderType,
    /// Limit price. Ignored for MARKET orders.
    pub limit_price: Option<Decimal>,
    /// Lots.
    pub lot_amount: u32,
}

/// Response DTO for a lot check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateLotResponseDto {
    /// True if the order would be accepted right now.
    pub valid: bool,
    /// Reason when invalid.
    pub message: Option<String>,
}

impl ValidateLotResponseDto {
    /// Order would be accepted.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    /// Order would be refused.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// DTO representing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDto {
    /// Order ID.
    pub order_id: OrderId,
    /// Human-facing order code.
    pub order_code: String,
    /// Bulk request.
    pub batch_id: BatchId,
    /// Account.
    pub customer_account_id: AccountId,
    /// Customer.
    pub customer_id: CustomerId,
    /// Asset.
    pub asset_id: AssetId,
    /// Side.
    pub side: OrderSide,
    /// Type.
    pub order_type: OrderType,
    /// Status.
    pub status: OrderStatus,
    /// Why the order was rejected or failed.
    pub status_reason: Option<String>,
    /// Lots requested.
    pub initial_lots: u32,
    /// Lots filled.
    pub filled_lots: u32,
    /// Lots still open.
    pub remaining_lots: u32,
    /// Limit price, LIMIT orders only.
    pub limit_price: Option<Decimal>,
    /// Price the reservation was made at.
    pub locked_price: Decimal,
    /// Created at.
    pub created_at: Timestamp,
    /// Updated at.
    pub updated_at: Timestamp,
    /// Optimistic version; pass back when amending.
    pub version: u64,
}

impl OrderDto {
    /// Create from an Order aggregate.
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id(),
            order_code: order.code().to_string(),
            batch_id: order.batch_id().clone(),
            customer_account_id: order.customer_account_id(),
            customer_id: order.customer_id(),
            asset_id: order.asset_id(),
            side: order.side(),
            order_type: order.order_type(),
            status: order.status(),
            status_reason: order.status_reason().map(str::to_string),
            initial_lots: order.initial_lots().value(),
            filled_lots: order.filled_lots().value(),
            remaining_lots: order.remaining_lots().value(),
            limit_price: order.limit_price().map(|m| m.amount()),
            locked_price: order.locked_price().amount(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
            version: order.version(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_execution::CreateOrderCommand;
    use crate::domain::shared::{Lots, Money};
    use rust_decimal_macros::dec;

    #[test]
    fn order_dto_from_market_order_has_no_limit() {
        let order = Order::new(
            OrderId::new(7),
            CreateOrderCommand {
                batch_id: BatchId::new("b"),
                customer_account_id: AccountId::new(1),
                customer_id: CustomerId::new(1),
                asset_id: AssetId::new(1),
                side: OrderSide::Buy,
                order_type: OrderType::Market,
                lots: Lots::new(5),
                price: Money::new(dec!(12.34)),
                created_by: None,
            },
            Timestamp::now(),
        )
        .unwrap();

        let dto = OrderDto::from_order(&order);
        assert_eq!(dto.limit_price, None);
        assert_eq!(dto.locked_price, dec!(12.34));
        assert_eq!(dto.remaining_lots, 5);
        assert_eq!(dto.status, OrderStatus::Queued);
    }

    #[test]
    fn bulk_request_deserializes_from_json() {
        let json = r#"{
            "bist_code": "THYAO",
            "side": "BUY",
            "order_type": "LIMIT",
            "limit_price": "280.25",
            "customer_orders": [{"customer_account_id": 1, "lot_amount": 10}],
            "created_by": null
        }"#;
        let request: BulkOrderRequestDto = serde_json::from_str(json).unwrap();
        assert_eq!(request.customer_orders.len(), 1);
        assert_eq!(request.limit_price, Some(dec!(280.25)));
    }
}
