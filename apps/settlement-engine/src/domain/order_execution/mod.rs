//! Order Execution Bounded Context
//!
//! Orders, their executions, the status state machine, tick-size rules and
//! the price-time matching engine.

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod repository;
pub mod services;
pub mod value_objects;

pub use aggregate::{CreateOrderCommand, NewExecution, Order, OrderExecution};
pub use errors::OrderError;
pub use events::{OrderCancelledEvent, OrderEvent, OrderExecutedEvent};
pub use repository::{ExecutionRepository, OrderFilter, OrderRepository, Page, PageRequest};
pub use services::{Fill, OrderMatchingEngine, OrderStateMachine};
pub use value_objects::{OrderSide, OrderStatus, OrderType, tick_size};
