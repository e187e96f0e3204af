//! Live Price Port (Driven Port)
//!
//! Last traded price per asset, used to lock the reservation price of
//! MARKET orders.

use async_trait::async_trait;

use crate::domain::shared::Money;

/// Live price lookup error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LivePriceError {
    /// The price source could not be reached.
    #[error("Live price source unavailable: {message}")]
    Unavailable {
        /// Failure description.
        message: String,
    },
}

/// Port for reading live prices.
#[async_trait]
pub trait LivePricePort: Send + Sync {
    /// Current price of the asset, or `None` if no price is known.
    async fn live_price(&self, bist_code: &str) -> Result<Option<Money>, LivePriceError>;
}
