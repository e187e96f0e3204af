//! Brokerage Firm Service
//!
//! Administers brokerage firms. At most one firm is ACTIVE; its rate is
//! the commission rate applied to every execution.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::CommissionRateProvider;
use crate::domain::brokerage::{BrokerageError, BrokerageFirm, BrokerageFirmRepository};
use crate::domain::shared::{FirmId, Timestamp};

/// Request to register a firm.
#[derive(Debug, Clone)]
pub struct NewFirm {
    /// Display name.
    pub name: String,
    /// Commission rate in [0, 1].
    pub commission_rate: Decimal,
    /// Make it the active firm immediately. Fails if another firm is active.
    pub active: bool,
}

/// Firm administration.
pub struct BrokerageFirmService<R>
where
    R: BrokerageFirmRepository,
{
    repository: Arc<R>,
    rates: Arc<CommissionRateProvider<R>>,
    // Serializes mutations so the single-active rule holds.
    write_lock: Mutex<()>,
}

impl<R> BrokerageFirmService<R>
where
    R: BrokerageFirmRepository,
{
    /// Create the service.
    pub fn new(repository: Arc<R>, rates: Arc<CommissionRateProvider<R>>) -> Self {
        Self {
            repository,
            rates,
            write_lock: Mutex::new(()),
        }
    }

    /// Register a firm.
    pub async fn create(&self, request: NewFirm) -> Result<BrokerageFirm, BrokerageError> {
        let _guard = self.write_lock.lock().await;
        let now = Timestamp::now();
        let id = self.repository.next_id().await?;
        let mut firm = BrokerageFirm::new(id, request.name, request.commission_rate, now)?;

        if request.active {
            if let Some(existing) = self.repository.find_active().await? {
                return Err(BrokerageError::MultipleActiveFirms {
                    existing: existing.id(),
                });
            }
            firm.activate(now);
        }

        self.repository.save(&firm).await?;
        self.rates.invalidate();
        tracing::info!(firm_id = %firm.id(), active = request.active, "Brokerage firm created");
        Ok(firm)
    }

    /// Change a firm's commission rate.
    pub async fn update_commission_rate(
        &self,
        id: FirmId,
        rate: Decimal,
    ) -> Result<BrokerageFirm, BrokerageError> {
        let _guard = self.write_lock.lock().await;
        let mut firm = self.load(id).await?;
        firm.set_commission_rate(rate, Timestamp::now())?;
        self.repository.save(&firm).await?;
        self.rates.invalidate();
        tracing::info!(firm_id = %id, rate = %rate, "Commission rate updated");
        Ok(firm)
    }

    /// Make `id` the active firm, deactivating the previous one.
    pub async fn activate(&self, id: FirmId) -> Result<BrokerageFirm, BrokerageError> {
        let _guard = self.write_lock.lock().await;
        let now = Timestamp::now();
        let mut firm = self.load(id).await?;

        if let Some(mut previous) = self.repository.find_active().await? {
            if previous.id() == id {
                return Ok(previous);
            }
            previous.deactivate(now);
            self.repository.save(&previous).await?;
            tracing::info!(firm_id = %previous.id(), "Brokerage firm deactivated");
        }

        firm.activate(now);
        self.repository.save(&firm).await?;
        self.rates.invalidate();
        tracing::info!(firm_id = %id, "Brokerage firm activated");
        Ok(firm)
    }

    /// Remove an inactive firm.
    pub async fn delete(&self, id: FirmId) -> Result<(), BrokerageError> {
        let _guard = self.write_lock.lock().await;
        let firm = self.load(id).await?;
        if firm.is_active() {
            return Err(BrokerageError::ActiveFirmDeletion { id });
        }
        self.repository.delete(id).await?;
        self.rates.invalidate();
        tracing::info!(firm_id = %id, "Brokerage firm deleted");
        Ok(())
    }

    /// Every firm.
    pub async fn list(&self) -> Result<Vec<BrokerageFirm>, BrokerageError> {
        self.repository.find_all().await
    }

    /// Commission rate of the active firm.
    pub async fn active_commission_rate(&self) -> Result<Decimal, BrokerageError> {
        self.rates.active_rate().await
    }

    async fn load(&self, id: FirmId) -> Result<BrokerageFirm, BrokerageError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(BrokerageError::NotFound { id })
    }
}
