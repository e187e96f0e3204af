//! Portfolio Repository Ports
//!
//! Used inside a unit of work. Account and holding updates are
//! compare-and-swap on the version they were read at.

use crate::domain::portfolio::{
    AccountTransaction, Asset, Customer, CustomerAccount, CustomerAsset,
};
use crate::domain::shared::{
    AccountId, AssetId, CustomerId, OrderId, StorageError, TransactionId,
};

/// Cash accounts.
pub trait AccountRepository {
    /// Find account by ID.
    fn find_account(&self, id: AccountId) -> Result<Option<CustomerAccount>, StorageError>;

    /// Every account.
    fn find_all_accounts(&self) -> Result<Vec<CustomerAccount>, StorageError>;

    /// Write an account if its version still matches storage, then advance it.
    fn update_account(&mut self, account: &mut CustomerAccount) -> Result<(), StorageError>;
}

/// Asset holdings keyed by (customer, asset).
pub trait HoldingRepository {
    /// Find one holding.
    fn find_holding(
        &self,
        customer_id: CustomerId,
        asset_id: AssetId,
    ) -> Result<Option<CustomerAsset>, StorageError>;

    /// Every holding.
    fn find_all_holdings(&self) -> Result<Vec<CustomerAsset>, StorageError>;

    /// Insert or compare-and-swap update a holding, then advance its version.
    fn save_holding(&mut self, holding: &mut CustomerAsset) -> Result<(), StorageError>;

    /// Remove an emptied holding.
    fn delete_holding(&mut self, customer_id: CustomerId, asset_id: AssetId)
    -> Result<(), StorageError>;
}

/// Append-only account ledger.
pub trait LedgerRepository {
    /// Allocate the identity for a new ledger row.
    fn next_transaction_id(&mut self) -> TransactionId;

    /// Append a row.
    fn append_transaction(&mut self, row: &AccountTransaction) -> Result<(), StorageError>;

    /// Rows that reference an order, oldest first.
    fn find_transactions_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<AccountTransaction>, StorageError>;

    /// Rows of an account, oldest first.
    fn find_transactions_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<AccountTransaction>, StorageError>;
}

/// Listed assets.
pub trait AssetRepository {
    /// Find asset by ID.
    fn find_asset(&self, id: AssetId) -> Result<Option<Asset>, StorageError>;

    /// Find asset by exchange code.
    fn find_asset_by_code(&self, bist_code: &str) -> Result<Option<Asset>, StorageError>;
}

/// Customers.
pub trait CustomerRepository {
    /// Find customer by ID.
    fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, StorageError>;
}
