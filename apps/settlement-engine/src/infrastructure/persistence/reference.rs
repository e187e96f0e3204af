//! In-memory holiday calendar and brokerage firm stores.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::brokerage::{BrokerageError, BrokerageFirm, BrokerageFirmRepository};
use crate::domain::calendar::{CalendarError, Holiday, HolidayRepository};
use crate::domain::shared::FirmId;

/// In-memory implementation of `HolidayRepository`.
#[derive(Debug, Default)]
pub struct InMemoryHolidayRepository {
    holidays: RwLock<Vec<Holiday>>,
}

impl InMemoryHolidayRepository {
    /// Create an empty calendar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a holiday.
    pub fn add(&self, holiday: Holiday) {
        self.holidays.write().push(holiday);
    }
}

#[async_trait]
impl HolidayRepository for InMemoryHolidayRepository {
    async fn find_all(&self) -> Result<Vec<Holiday>, CalendarError> {
        Ok(self.holidays.read().clone())
    }
}

/// In-memory implementation of `BrokerageFirmRepository`.
#[derive(Debug, Default)]
pub struct InMemoryBrokerageFirmRepository {
    firms: RwLock<BTreeMap<FirmId, BrokerageFirm>>,
    last_id: AtomicU64,
}

impl InMemoryBrokerageFirmRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BrokerageFirmRepository for InMemoryBrokerageFirmRepository {
    async fn next_id(&self) -> Result<FirmId, BrokerageError> {
        Ok(FirmId::new(self.last_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn save(&self, firm: &BrokerageFirm) -> Result<(), BrokerageError> {
        self.firms.write().insert(firm.id(), firm.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: FirmId) -> Result<Option<BrokerageFirm>, BrokerageError> {
        Ok(self.firms.read().get(&id).cloned())
    }

    async fn find_active(&self) -> Result<Option<BrokerageFirm>, BrokerageError> {
        Ok(self.firms.read().values().find(|f| f.is_active()).cloned())
    }

    async fn find_all(&self) -> Result<Vec<BrokerageFirm>, BrokerageError> {
        Ok(self.firms.read().values().cloned().collect())
    }

    async fn delete(&self, id: FirmId) -> Result<(), BrokerageError> {
        self.firms
            .write()
            .remove(&id)
            .map(drop)
            .ok_or(BrokerageError::NotFound { id })
    }
}
