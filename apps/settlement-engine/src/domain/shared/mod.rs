//! Shared Domain Types
//!
//! Value objects and errors shared across bounded contexts.

pub mod errors;
pub mod value_objects;

pub use errors::{DomainError, StorageError};
pub use value_objects::{
    AccountId, AssetId, BatchId, CustomerId, ExecutionId, FirmId, Lots, Money, OrderCode,
    OrderId, Timestamp, TransactionId,
};
