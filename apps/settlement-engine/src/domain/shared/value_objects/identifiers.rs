//! Strongly-typed identifiers for domain entities.
//!
//! These prevent mixing up IDs from different contexts. Row identities are
//! assigned by storage; batch and order codes are generated UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create an identifier from its raw value.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Get the raw value.
            #[must_use]
            pub const fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

macro_rules! define_code {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new code from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a new unique code using UUID v4.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(OrderId, "Storage identity of an order.");
define_id!(ExecutionId, "Storage identity of an order execution.");
define_id!(AccountId, "Storage identity of a customer account.");
define_id!(CustomerId, "Storage identity of a customer.");
define_id!(AssetId, "Storage identity of a tradeable asset.");
define_id!(TransactionId, "Storage identity of an account ledger row.");
define_id!(FirmId, "Storage identity of a brokerage firm.");

define_code!(BatchId, "Identifier grouping the orders of one bulk request.");
define_code!(OrderCode, "Externally visible unique code of an order.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_id_display_and_value() {
        let id = OrderId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(format!("{id}"), "42");
    }

    #[test]
    fn numeric_ids_order_by_value() {
        assert!(AccountId::new(1) < AccountId::new(2));
    }

    #[test]
    fn batch_id_generate_is_unique() {
        let a = BatchId::generate();
        let b = BatchId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn order_code_serializes_transparently() {
        let code = OrderCode::new("abc");
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
