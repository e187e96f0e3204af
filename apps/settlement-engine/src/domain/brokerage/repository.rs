//! Brokerage Firm Repository Port

use async_trait::async_trait;

use super::{BrokerageError, BrokerageFirm};
use crate::domain::shared::FirmId;

/// Storage for brokerage firm configuration.
#[async_trait]
pub trait BrokerageFirmRepository: Send + Sync {
    /// Allocate the identity for a new firm.
    async fn next_id(&self) -> Result<FirmId, BrokerageError>;

    /// Insert or replace a firm.
    async fn save(&self, firm: &BrokerageFirm) -> Result<(), BrokerageError>;

    /// Find firm by ID.
    async fn find_by_id(&self, id: FirmId) -> Result<Option<BrokerageFirm>, BrokerageError>;

    /// The ACTIVE firm, if any.
    async fn find_active(&self) -> Result<Option<BrokerageFirm>, BrokerageError>;

    /// Every firm.
    async fn find_all(&self) -> Result<Vec<BrokerageFirm>, BrokerageError>;

    /// Remove a firm.
    async fn delete(&self, id: FirmId) -> Result<(), BrokerageError>;
}
