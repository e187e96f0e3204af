//! Unit of Work Port
//!
//! One business operation runs as one unit of work: every repository write
//! made through the `Transaction` either commits together or not at all.
//! A compare-and-swap failure on any versioned row aborts the whole unit.

use crate::domain::order_execution::{ExecutionRepository, OrderRepository};
use crate::domain::portfolio::{
    AccountRepository, AssetRepository, CustomerRepository, HoldingRepository, LedgerRepository,
};
use crate::error::EngineError;

/// Transactional view over every repository the core writes to.
pub trait Transaction:
    OrderRepository
    + ExecutionRepository
    + AccountRepository
    + HoldingRepository
    + LedgerRepository
    + AssetRepository
    + CustomerRepository
{
}

impl<T> Transaction for T where
    T: OrderRepository
        + ExecutionRepository
        + AccountRepository
        + HoldingRepository
        + LedgerRepository
        + AssetRepository
        + CustomerRepository
{
}

/// Scope grouping the storage mutations of one business operation.
pub trait UnitOfWork: Send + Sync {
    /// Run `work` atomically.
    ///
    /// Commits when `work` returns `Ok`, rolls back every write when it
    /// returns `Err`. Must not be held across an await point.
    fn transact<T, F>(&self, work: F) -> Result<T, EngineError>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, EngineError>;
}
