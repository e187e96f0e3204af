//! Order Execution Errors

use rust_decimal::Decimal;

use crate::domain::order_execution::value_objects::OrderStatus;
use crate::domain::shared::{ExecutionId, Lots, Money};

/// Errors raised by the order and execution aggregates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    /// Invalid order parameters.
    #[error("Invalid order parameter '{field}': {message}")]
    InvalidParameters {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Price is not a multiple of its bracket's tick.
    #[error("Price {price} is not valid for tick size {tick}")]
    InvalidTickSize {
        /// Offending price.
        price: Money,
        /// Tick of the price's bracket.
        tick: Decimal,
    },

    /// Status transition not in the transition table.
    #[error("Invalid order state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current status.
        from: OrderStatus,
        /// Attempted status.
        to: OrderStatus,
    },

    /// Order cannot be cancelled in its current status.
    #[error("Order in status {status} cannot be cancelled")]
    NotCancellable {
        /// Current status.
        status: OrderStatus,
    },

    /// Order cannot be amended in its current status.
    #[error("Order in status {status} cannot be updated")]
    NotUpdatable {
        /// Current status.
        status: OrderStatus,
    },

    /// Amended quantity does not exceed what already executed.
    #[error("New lot amount {requested} must exceed filled lot amount {filled}")]
    LotsBelowFilled {
        /// Requested total lots.
        requested: Lots,
        /// Lots already filled.
        filled: Lots,
    },

    /// Fill larger than the remaining quantity.
    #[error("Fill of {requested} lots exceeds remaining {remaining}")]
    Overfill {
        /// Lots in the fill.
        requested: Lots,
        /// Lots still open.
        remaining: Lots,
    },

    /// Execution already settled.
    #[error("Execution {execution_id} is already settled")]
    AlreadySettled {
        /// Execution identifier.
        execution_id: ExecutionId,
    },
}
