//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod identifiers;
mod lots;
mod money;
mod timestamp;

pub use identifiers::{
    AccountId, AssetId, BatchId, CustomerId, ExecutionId, FirmId, OrderCode, OrderId,
    TransactionId,
};
pub use lots::Lots;
pub use money::Money;
pub use timestamp::Timestamp;
