//! Brokerage errors.

use rust_decimal::Decimal;

use crate::domain::shared::FirmId;

/// Errors from brokerage firm configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerageError {
    /// Commission rate outside [0, 1].
    #[error("Commission rate must be between 0 and 1, got {rate}")]
    InvalidCommissionRate {
        /// Offending rate.
        rate: Decimal,
    },

    /// Firm name empty.
    #[error("Brokerage firm name cannot be empty")]
    EmptyName,

    /// No firm is ACTIVE.
    #[error("No active brokerage firm is configured")]
    NoActiveFirm,

    /// A second firm would become ACTIVE.
    #[error("Brokerage firm {existing} is already active")]
    MultipleActiveFirms {
        /// The currently active firm.
        existing: FirmId,
    },

    /// The active firm cannot be deleted.
    #[error("Brokerage firm {id} is active and cannot be deleted")]
    ActiveFirmDeletion {
        /// Firm.
        id: FirmId,
    },

    /// Unknown firm.
    #[error("Brokerage firm not found: {id}")]
    NotFound {
        /// Firm.
        id: FirmId,
    },

    /// Backing store failed.
    #[error("Brokerage firm store unavailable: {message}")]
    Storage {
        /// Failure description.
        message: String,
    },
}
