//! Market data adapters.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{LivePriceError, LivePricePort};
use crate::domain::shared::Money;

/// Live prices held in memory, keyed by exchange code.
#[derive(Debug, Default)]
pub struct InMemoryLivePrices {
    prices: RwLock<HashMap<String, Money>>,
}

impl InMemoryLivePrices {
    /// Create an empty price table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the last traded price of an asset.
    pub fn set_price(&self, bist_code: impl Into<String>, price: Money) {
        self.prices
            .write()
            .insert(bist_code.into().to_ascii_uppercase(), price);
    }
}

#[async_trait]
impl LivePricePort for InMemoryLivePrices {
    async fn live_price(&self, bist_code: &str) -> Result<Option<Money>, LivePriceError> {
        Ok(self
            .prices
            .read()
            .get(&bist_code.to_ascii_uppercase())
            .copied())
    }
}
