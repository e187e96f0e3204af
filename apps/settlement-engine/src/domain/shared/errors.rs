//! Domain errors shared by every bounded context.

use std::fmt;

/// Domain-level errors that can occur in business logic.
///
/// These errors are independent of infrastructure concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid state transition attempted.
    InvalidStateTransition {
        /// Entity type (e.g., "Order").
        entity: String,
        /// Current state.
        from: String,
        /// Attempted state.
        to: String,
    },

    /// Invalid value for a field.
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Business rule violation.
    BusinessRuleViolation {
        /// Rule name or code.
        rule: String,
        /// Description of the violation.
        message: String,
    },

    /// Entity not found.
    NotFound {
        /// Entity type.
        entity_type: String,
        /// Entity identifier.
        id: String,
    },

    /// Aggregate invariant violated.
    InvariantViolation {
        /// Aggregate type.
        aggregate: String,
        /// Invariant that was violated.
        invariant: String,
    },
}

impl DomainError {
    /// Shorthand for an `InvalidValue` error.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStateTransition { entity, from, to } => {
                write!(f, "Invalid {entity} state transition from {from} to {to}")
            }
            Self::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{field}': {message}")
            }
            Self::BusinessRuleViolation { rule, message } => {
                write!(f, "Business rule '{rule}' violated: {message}")
            }
            Self::NotFound { entity_type, id } => write!(f, "{entity_type} not found: {id}"),
            Self::InvariantViolation {
                aggregate,
                invariant,
            } => write!(f, "{aggregate} invariant violated: {invariant}"),
        }
    }
}

impl std::error::Error for DomainError {}

/// Errors raised by storage adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A compare-and-swap write observed a different stored version.
    #[error("{entity} {id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        /// Entity type.
        entity: &'static str,
        /// Entity identifier.
        id: String,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// The row to update does not exist.
    #[error("{entity} {id} does not exist")]
    Missing {
        /// Entity type.
        entity: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// A row with the same key already exists.
    #[error("{entity} {id} already exists")]
    Duplicate {
        /// Entity type.
        entity: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// The backing store failed.
    #[error("Storage unavailable: {message}")]
    Unavailable {
        /// Failure description.
        message: String,
    },
}
