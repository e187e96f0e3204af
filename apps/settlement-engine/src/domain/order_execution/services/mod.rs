//! Domain Services

mod matching_engine;
mod order_state_machine;

pub use matching_engine::{Fill, OrderMatchingEngine};
pub use order_state_machine::OrderStateMachine;
