//! Reference data consulted by the ledger and order intake.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{AssetId, CustomerId, Money};

/// A tradeable listed asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset ID.
    pub id: AssetId,
    /// Exchange ticker, e.g. `THYAO`.
    pub bist_code: String,
    /// ISIN.
    pub isin_code: String,
    /// Issuer name.
    pub company_name: String,
    /// Trading currency.
    pub currency: String,
    /// Business days between execution and settlement.
    pub settlement_days: u32,
    /// Cap on price times lots for a single order.
    pub max_order_value: Option<Money>,
}

/// A brokerage customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer ID.
    pub id: CustomerId,
    /// Externally visible customer code.
    pub customer_code: String,
    /// Display name.
    pub name: String,
}
