//! Infrastructure Layer
//!
//! Adapters for the application ports.

pub mod events;
pub mod market_data;
pub mod persistence;
