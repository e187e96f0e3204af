//! Domain Layer
//!
//! Pure business logic with no infrastructure dependencies.
//!
//! # Bounded Contexts
//!
//! - `order_execution`: Orders, executions, tick rules, price-time matching
//! - `portfolio`: Cash accounts, holdings, the account ledger
//! - `calendar`: Business-day arithmetic over a holiday cache
//! - `brokerage`: Brokerage firms and the active commission rate
//! - `shared`: Value objects used across contexts

pub mod brokerage;
pub mod calendar;
pub mod order_execution;
pub mod portfolio;
pub mod shared;
