//! Order State Machine Service
//!
//! Explicit, exhaustive transition table for order status.

use crate::domain::order_execution::errors::OrderError;
use crate::domain::order_execution::value_objects::OrderStatus;

/// Order State Machine for validating transitions.
pub struct OrderStateMachine;

impl OrderStateMachine {
    /// Check if a state transition is valid.
    #[must_use]
    pub const fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        matches!(
            (from, to),
            // From Queued
            (OrderStatus::Queued, OrderStatus::Active)
                | (OrderStatus::Queued, OrderStatus::Rejected)
                | (OrderStatus::Queued, OrderStatus::Cancelled)
                | (OrderStatus::Queued, OrderStatus::Failed)
                // From Active
                | (OrderStatus::Active, OrderStatus::PartiallyFilled)
                | (OrderStatus::Active, OrderStatus::Filled)
                | (OrderStatus::Active, OrderStatus::Cancelled)
                | (OrderStatus::Active, OrderStatus::Failed)
                // From PartiallyFilled
                | (OrderStatus::PartiallyFilled, OrderStatus::PartiallyFilled)
                | (OrderStatus::PartiallyFilled, OrderStatus::Filled)
                | (OrderStatus::PartiallyFilled, OrderStatus::Cancelled)
                | (OrderStatus::PartiallyFilled, OrderStatus::Failed)
        )
    }

    /// Validate a state transition.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is invalid.
    pub const fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(OrderError::InvalidStateTransition { from, to })
        }
    }

    /// Get all valid next states from a given state.
    #[must_use]
    pub fn valid_next_states(from: OrderStatus) -> Vec<OrderStatus> {
        match from {
            OrderStatus::Queued => vec![
                OrderStatus::Active,
                OrderStatus::Rejected,
                OrderStatus::Cancelled,
                OrderStatus::Failed,
            ],
            OrderStatus::Active | OrderStatus::PartiallyFilled => vec![
                OrderStatus::PartiallyFilled,
                OrderStatus::Filled,
                OrderStatus::Cancelled,
                OrderStatus::Failed,
            ],
            OrderStatus::Filled
            | OrderStatus::Cancelled
            | OrderStatus::Rejected
            | OrderStatus::Failed => vec![],
        }
    }
}
