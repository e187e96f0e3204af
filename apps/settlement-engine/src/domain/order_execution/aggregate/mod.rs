//! Order Execution Aggregates

mod order;
mod order_execution;

pub use order::{CreateOrderCommand, Order};
pub use order_execution::{NewExecution, OrderExecution};
