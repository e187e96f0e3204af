//! Engine error taxonomy.
//!
//! Every layer's error converts into [`EngineError`], which is what the
//! calling layer sees.
//!
//! | Kind | Meaning | Retry |
//! |------|---------|-------|
//! | `Validation` | Malformed input, off-tick price, closed market | No |
//! | `BusinessRule` | Insufficient balance/asset, wrong order state | No |
//! | `ConcurrencyConflict` | Stale version on write | Yes, with fresh state |
//! | `NotFound` | Unknown order/account/asset/firm | No |
//! | `Settlement` | Ledger mutation failed during a sweep | Next sweep |
//! | `Storage` | Backing store failure | Caller's choice |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::brokerage::BrokerageError;
use crate::domain::calendar::CalendarError;
use crate::domain::order_execution::OrderError;
use crate::domain::portfolio::LedgerError;
use crate::domain::shared::{DomainError, ExecutionId, StorageError};

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation
    /// Malformed request.
    InvalidRequest,
    /// Price off its tick.
    InvalidTickSize,
    /// Non-positive amount or quantity.
    InvalidTransactionAmount,
    /// Non-business day or outside session hours.
    MarketClosed,
    /// Order value above the asset cap.
    MaxOrderValueExceeded,
    /// Bad calendar arithmetic argument.
    InvalidDayCount,
    /// Commission rate outside [0, 1].
    InvalidCommissionRate,

    // Business rule
    /// Free balance too low.
    InsufficientBalance,
    /// Free lots too low.
    InsufficientAsset,
    /// Order not in a state that allows the operation.
    InvalidOrderState,
    /// Account closed or suspended.
    InactiveAccount,
    /// Active-firm uniqueness or deletion rule.
    BrokerageFirmRule,

    // Other kinds
    /// Stale version.
    ConcurrencyConflict,
    /// Unknown entity.
    NotFound,
    /// Settlement sweep failure.
    SettlementFailed,
    /// Storage failure.
    StorageUnavailable,
}

impl ErrorCode {
    /// Reason string for logs and API payloads.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidTickSize => "INVALID_TICK_SIZE",
            Self::InvalidTransactionAmount => "INVALID_TRANSACTION_AMOUNT",
            Self::MarketClosed => "MARKET_CLOSED",
            Self::MaxOrderValueExceeded => "MAX_ORDER_VALUE_EXCEEDED",
            Self::InvalidDayCount => "INVALID_DAY_COUNT",
            Self::InvalidCommissionRate => "INVALID_COMMISSION_RATE",
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::InsufficientAsset => "INSUFFICIENT_ASSET",
            Self::InvalidOrderState => "INVALID_ORDER_STATE",
            Self::InactiveAccount => "INACTIVE_ACCOUNT",
            Self::BrokerageFirmRule => "BROKERAGE_FIRM_RULE",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::SettlementFailed => "SETTLEMENT_FAILED",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
        }
    }
}

/// Public error type of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed input; nothing was changed.
    #[error("Validation failed [{}]: {message}", .code.reason())]
    Validation {
        /// Specific code.
        code: ErrorCode,
        /// Human-readable detail.
        message: String,
    },

    /// A business rule refused the operation; nothing was changed.
    #[error("Business rule violated [{}]: {message}", .code.reason())]
    BusinessRule {
        /// Specific code.
        code: ErrorCode,
        /// Human-readable detail.
        message: String,
    },

    /// A write observed a stale version. Retry with fresh state.
    #[error("Concurrency conflict: {message}")]
    ConcurrencyConflict {
        /// Human-readable detail.
        message: String,
    },

    /// Unknown entity.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity type.
        entity: String,
        /// Identifier looked up.
        id: String,
    },

    /// Settlement of one execution failed; it stays unsettled.
    #[error("Settlement of execution {execution_id} failed: {message}")]
    Settlement {
        /// Execution that failed to settle.
        execution_id: ExecutionId,
        /// Underlying failure.
        message: String,
    },

    /// Backing store failure.
    #[error("Storage error: {message}")]
    Storage {
        /// Underlying failure.
        message: String,
    },
}

impl EngineError {
    /// Build a validation error.
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    /// Build a business-rule error.
    pub fn business_rule(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::BusinessRule {
            code,
            message: message.into(),
        }
    }

    /// Build a not-found error.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } | Self::BusinessRule { code, .. } => *code,
            Self::ConcurrencyConflict { .. } => ErrorCode::ConcurrencyConflict,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Settlement { .. } => ErrorCode::SettlementFailed,
            Self::Storage { .. } => ErrorCode::StorageUnavailable,
        }
    }

    /// True if the caller should retry with fresh state.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

impl From<OrderError> for EngineError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::InvalidTickSize { .. } => {
                Self::validation(ErrorCode::InvalidTickSize, message)
            }
            OrderError::InvalidParameters { .. } | OrderError::LotsBelowFilled { .. } => {
                Self::validation(ErrorCode::InvalidRequest, message)
            }
            OrderError::InvalidStateTransition { .. }
            | OrderError::NotCancellable { .. }
            | OrderError::NotUpdatable { .. }
            | OrderError::Overfill { .. }
            | OrderError::AlreadySettled { .. } => {
                Self::business_rule(ErrorCode::InvalidOrderState, message)
            }
        }
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::InvalidTransactionAmount { .. } => {
                Self::validation(ErrorCode::InvalidTransactionAmount, message)
            }
            LedgerError::InsufficientAvailableBalance { .. } => {
                Self::business_rule(ErrorCode::InsufficientBalance, message)
            }
            LedgerError::InsufficientAvailableAsset { .. }
            | LedgerError::InsufficientBlockedAsset { .. } => {
                Self::business_rule(ErrorCode::InsufficientAsset, message)
            }
            LedgerError::InactiveAccount { .. } => {
                Self::business_rule(ErrorCode::InactiveAccount, message)
            }
        }
    }
}

impl From<CalendarError> for EngineError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::NegativeDayCount { .. } | CalendarError::OutOfRange { .. } => {
                Self::validation(ErrorCode::InvalidDayCount, err.to_string())
            }
            CalendarError::Storage { message } => Self::Storage { message },
        }
    }
}

impl From<BrokerageError> for EngineError {
    fn from(err: BrokerageError) -> Self {
        let message = err.to_string();
        match err {
            BrokerageError::InvalidCommissionRate { .. } | BrokerageError::EmptyName => {
                Self::validation(ErrorCode::InvalidCommissionRate, message)
            }
            BrokerageError::MultipleActiveFirms { .. } | BrokerageError::ActiveFirmDeletion { .. } => {
                Self::business_rule(ErrorCode::BrokerageFirmRule, message)
            }
            BrokerageError::NoActiveFirm => Self::not_found("Active brokerage firm", "-"),
            BrokerageError::NotFound { id } => Self::not_found("Brokerage firm", id),
            BrokerageError::Storage { message } => Self::Storage { message },
        }
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::VersionConflict { .. } => Self::ConcurrencyConflict {
                message: err.to_string(),
            },
            StorageError::Missing { entity, id } => Self::not_found(entity, id),
            StorageError::Duplicate { .. } | StorageError::Unavailable { .. } => Self::Storage {
                message: err.to_string(),
            },
        }
    }
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::InvalidValue { .. } => Self::validation(ErrorCode::InvalidRequest, message),
            DomainError::NotFound { entity_type, id } => Self::NotFound {
                entity: entity_type,
                id,
            },
            DomainError::InvalidStateTransition { .. } => {
                Self::business_rule(ErrorCode::InvalidOrderState, message)
            }
            DomainError::BusinessRuleViolation { .. } | DomainError::InvariantViolation { .. } => {
                Self::business_rule(ErrorCode::InvalidRequest, message)
            }
        }
    }
}
