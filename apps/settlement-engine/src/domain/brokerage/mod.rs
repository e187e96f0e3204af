//! Brokerage Bounded Context
//!
//! Brokerage firms and the single active commission rate.

pub mod brokerage_firm;
pub mod errors;
pub mod repository;

pub use brokerage_firm::{BrokerageFirm, FirmStatus};
pub use errors::BrokerageError;
pub use repository::BrokerageFirmRepository;
