//! Commission Rate Provider
//!
//! Read-through cache of the active brokerage firm's commission rate.
//! Firm mutations call `invalidate`; the next read goes to the store.

use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::domain::brokerage::{BrokerageError, BrokerageFirmRepository};

/// Cached lookup of the active commission rate.
#[derive(Debug)]
pub struct CommissionRateProvider<R>
where
    R: BrokerageFirmRepository,
{
    repository: Arc<R>,
    cached: RwLock<Option<Decimal>>,
}

impl<R> CommissionRateProvider<R>
where
    R: BrokerageFirmRepository,
{
    /// Create a provider with an empty cache.
    pub const fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            cached: RwLock::new(None),
        }
    }

    /// Rate of the ACTIVE firm.
    ///
    /// # Errors
    ///
    /// `NoActiveFirm` if no firm is active.
    pub async fn active_rate(&self) -> Result<Decimal, BrokerageError> {
        if let Some(rate) = *self.cached.read() {
            return Ok(rate);
        }

        let firm = self
            .repository
            .find_active()
            .await?
            .ok_or(BrokerageError::NoActiveFirm)?;
        let rate = firm.commission_rate();
        *self.cached.write() = Some(rate);
        tracing::debug!(firm_id = %firm.id(), rate = %rate, "Commission rate loaded");
        Ok(rate)
    }

    /// Drop the cached rate.
    pub fn invalidate(&self) {
        *self.cached.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::brokerage::BrokerageFirm;
    use crate::domain::shared::{FirmId, Timestamp};
    use crate::infrastructure::persistence::InMemoryBrokerageFirmRepository;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn missing_active_firm_is_an_error() {
        let provider = CommissionRateProvider::new(Arc::new(InMemoryBrokerageFirmRepository::new()));
        assert_eq!(
            provider.active_rate().await.unwrap_err(),
            BrokerageError::NoActiveFirm
        );
    }

    #[tokio::test]
    async fn rate_is_cached_until_invalidated() {
        let repo = Arc::new(InMemoryBrokerageFirmRepository::new());
        let mut firm = BrokerageFirm::new(FirmId::new(1), "Acme", dec!(0.002), Timestamp::now()).unwrap();
        firm.activate(Timestamp::now());
        repo.save(&firm).await.unwrap();

        let provider = CommissionRateProvider::new(Arc::clone(&repo));
        assert_eq!(provider.active_rate().await.unwrap(), dec!(0.002));

        firm.set_commission_rate(dec!(0.003), Timestamp::now()).unwrap();
        repo.save(&firm).await.unwrap();
        assert_eq!(provider.active_rate().await.unwrap(), dec!(0.002));

        provider.invalidate();
        assert_eq!(provider.active_rate().await.unwrap(), dec!(0.003));
    }
}
