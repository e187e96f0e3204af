//! Order and Execution Repository Ports
//!
//! These operate inside a unit of work: reads see the transaction's view and
//! writes become visible only when it commits. `update_*` methods are
//! compare-and-swap on the aggregate's version.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::aggregate::{Order, OrderExecution};
use crate::domain::order_execution::value_objects::{OrderSide, OrderStatus};
use crate::domain::shared::{
    AssetId, BatchId, CustomerId, ExecutionId, OrderId, StorageError,
};

/// Repository for Order aggregates.
pub trait OrderRepository {
    /// Allocate the identity for a new order.
    fn next_order_id(&mut self) -> OrderId;

    /// Persist a new order.
    fn insert_order(&mut self, order: &Order) -> Result<(), StorageError>;

    /// Write an order if its version still matches storage, then advance it.
    fn update_order(&mut self, order: &mut Order) -> Result<(), StorageError>;

    /// Find order by ID.
    fn find_order(&self, id: OrderId) -> Result<Option<Order>, StorageError>;

    /// Open (ACTIVE or PARTIALLY_FILLED) orders on one side of an asset's book.
    fn find_open_orders(&self, asset_id: AssetId, side: OrderSide)
    -> Result<Vec<Order>, StorageError>;

    /// Orders in any of the given statuses.
    fn find_orders_by_status(&self, statuses: &[OrderStatus]) -> Result<Vec<Order>, StorageError>;

    /// Orders matching a filter, newest first.
    fn find_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError>;
}

/// Repository for execution rows.
pub trait ExecutionRepository {
    /// Allocate the identity for a new execution.
    fn next_execution_id(&mut self) -> ExecutionId;

    /// Persist a new execution.
    fn insert_execution(&mut self, execution: &OrderExecution) -> Result<(), StorageError>;

    /// Persist the settlement flag of an execution.
    fn update_execution(&mut self, execution: &OrderExecution) -> Result<(), StorageError>;

    /// Find execution by ID.
    fn find_execution(&self, id: ExecutionId) -> Result<Option<OrderExecution>, StorageError>;

    /// Executions of one order, oldest first.
    fn find_executions_by_order(&self, order_id: OrderId)
    -> Result<Vec<OrderExecution>, StorageError>;

    /// Unsettled executions with a settlement date on or before `date`.
    fn find_unsettled_due(&self, date: NaiveDate) -> Result<Vec<OrderExecution>, StorageError>;
}

/// Criteria for the order listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    /// Orders of one bulk request.
    pub batch_id: Option<BatchId>,
    /// Orders of one customer.
    pub customer_id: Option<CustomerId>,
    /// Orders on one asset.
    pub asset_id: Option<AssetId>,
    /// Orders in one status.
    pub status: Option<OrderStatus>,
    /// Created on or after this date.
    pub created_from: Option<NaiveDate>,
    /// Created on or before this date.
    pub created_to: Option<NaiveDate>,
}

impl OrderFilter {
    /// True if `order` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        let created = order.created_at().date();
        self.batch_id.as_ref().is_none_or(|b| b == order.batch_id())
            && self.customer_id.is_none_or(|c| c == order.customer_id())
            && self.asset_id.is_none_or(|a| a == order.asset_id())
            && self.status.is_none_or(|s| s == order.status())
            && self.created_from.is_none_or(|from| created >= from)
            && self.created_to.is_none_or(|to| created <= to)
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page index.
    pub page: usize,
    /// Page size.
    pub size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 20 }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Page index.
    pub page: usize,
    /// Page size.
    pub size: usize,
    /// Items across all pages.
    pub total_elements: usize,
    /// Number of pages.
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Cut one page out of an already ordered result set.
    #[must_use]
    pub fn slice(items: Vec<T>, request: PageRequest) -> Self {
        let size = request.size.max(1);
        let total_elements = items.len();
        let total_pages = total_elements.div_ceil(size);
        let content = items
            .into_iter()
            .skip(request.page.saturating_mul(size))
            .take(size)
            .collect();
        Self {
            content,
            page: request.page,
            size,
            total_elements,
            total_pages,
        }
    }

    /// Transform the items, keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}
