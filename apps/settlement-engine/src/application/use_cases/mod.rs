//! Use Cases
//!
//! Application-specific business operations.

mod account_funding;
mod order_service;

pub use account_funding::AccountFundingUseCase;
pub use order_service::OrderService;
