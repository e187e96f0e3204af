//! Persistence adapters.

mod in_memory;
mod reference;

pub use in_memory::{InMemoryStore, StoreState};
pub use reference::{InMemoryBrokerageFirmRepository, InMemoryHolidayRepository};
