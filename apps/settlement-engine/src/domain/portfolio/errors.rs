//! Ledger errors.

use crate::domain::shared::{AccountId, AssetId, CustomerId, Lots, Money};

/// Errors raised by balance and holding mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A mutation amount or quantity was not strictly positive.
    #[error("Invalid transaction amount for '{field}': {message}")]
    InvalidTransactionAmount {
        /// Argument name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Free balance does not cover the request.
    #[error("Insufficient available balance on account {account_id}: required {required}, available {available}")]
    InsufficientAvailableBalance {
        /// Account.
        account_id: AccountId,
        /// Amount requested.
        required: Money,
        /// Balance minus blocked balance.
        available: Money,
    },

    /// Free lots do not cover the request.
    #[error("Insufficient available lots of asset {asset_id} for customer {customer_id}: required {required}, available {available}")]
    InsufficientAvailableAsset {
        /// Customer.
        customer_id: CustomerId,
        /// Asset.
        asset_id: AssetId,
        /// Lots requested.
        required: Lots,
        /// Total minus blocked lots.
        available: Lots,
    },

    /// Blocked lots do not cover a delivery.
    #[error("Blocked lots of asset {asset_id} for customer {customer_id} cannot cover delivery: required {required}, blocked {blocked}")]
    InsufficientBlockedAsset {
        /// Customer.
        customer_id: CustomerId,
        /// Asset.
        asset_id: AssetId,
        /// Lots to deliver.
        required: Lots,
        /// Lots currently blocked.
        blocked: Lots,
    },

    /// Account is closed or suspended.
    #[error("Account {account_id} is not active")]
    InactiveAccount {
        /// Account.
        account_id: AccountId,
    },
}

impl LedgerError {
    pub(crate) fn invalid_amount(err: &crate::domain::shared::DomainError, field: &str) -> Self {
        Self::InvalidTransactionAmount {
            field: field.to_string(),
            message: err.to_string(),
        }
    }
}
