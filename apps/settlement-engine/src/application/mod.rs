//! Application Layer
//!
//! Orchestrates domain objects inside units of work.
//!
//! - `ports`: Driven ports (unit of work, event publisher, live prices, clock)
//! - `services`: Ledger, execution, commission, settlement and background tasks
//! - `use_cases`: Order intake/cancel/update/listing and account funding
//! - `dto`: Request and response types for the calling layer

pub mod dto;
pub mod ports;
pub mod services;
pub mod use_cases;
