//! Order status in the lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status.
///
/// QUEUED is the only initial state. FILLED, CANCELLED, REJECTED and FAILED
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created. Orders entered outside session hours wait here, reserved,
    /// until the open.
    Queued,
    /// Reserved and resting in the book.
    Active,
    /// Some lots executed, remainder resting.
    PartiallyFilled,
    /// Every lot executed.
    Filled,
    /// Cancelled by the customer or at day end.
    Cancelled,
    /// Reservation failed at intake.
    Rejected,
    /// Processing failed after acceptance.
    Failed,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Cancelled | Self::Rejected | Self::Failed
        )
    }

    /// Returns true if the order rests in the book and can still fill.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Active | Self::PartiallyFilled)
    }

    /// Returns true if a customer may cancel the order.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Queued) || self.is_open()
    }

    /// Returns true if a customer may amend price or quantity.
    #[must_use]
    pub const fn is_updatable(&self) -> bool {
        matches!(self, Self::Queued) || self.is_open()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "QUEUED",
            Self::Active => "ACTIVE",
            Self::PartiallyFilled => "PARTIALLY_FILLED",
            Self::Filled => "FILLED",
            Self::Cancelled => "CANCELLED",
            Self::Rejected => "REJECTED",
            Self::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}
