//! In-memory storage.
//!
//! `InMemoryStore` implements the unit of work by staging each unit's writes
//! in an overlay over the committed state and applying them on success. Only
//! rows the unit writes are copied; reads merge the overlay with the
//! committed maps. Units are serialized by the store mutex; versioned writes
//! still compare-and-swap so a unit that acts on an order read in an earlier
//! unit sees the conflict.
//!
//! Suitable for testing and development. Not for production use.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::application::ports::{Transaction, UnitOfWork};
use crate::domain::order_execution::{
    ExecutionRepository, Order, OrderExecution, OrderFilter, OrderRepository, OrderSide,
    OrderStatus,
};
use crate::domain::portfolio::{
    AccountRepository, AccountTransaction, Asset, AssetRepository, Customer, CustomerAccount,
    CustomerAsset, CustomerRepository, HoldingRepository, LedgerRepository,
};
use crate::domain::shared::{
    AccountId, AssetId, CustomerId, ExecutionId, OrderId, StorageError, TransactionId,
};
use crate::error::EngineError;

type HoldingKey = (CustomerId, AssetId);

/// Everything the store holds.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    orders: BTreeMap<OrderId, Order>,
    executions: BTreeMap<ExecutionId, OrderExecution>,
    accounts: BTreeMap<AccountId, CustomerAccount>,
    holdings: BTreeMap<HoldingKey, CustomerAsset>,
    ledger: Vec<AccountTransaction>,
    assets: BTreeMap<AssetId, Asset>,
    customers: BTreeMap<CustomerId, Customer>,
    last_order_id: u64,
    last_execution_id: u64,
    last_transaction_id: u64,
}

/// In-memory implementation of every storage port.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a listed asset (for setup).
    pub fn insert_asset(&self, asset: Asset) {
        self.state.lock().assets.insert(asset.id, asset);
    }

    /// Add or replace a customer (for setup).
    pub fn insert_customer(&self, customer: Customer) {
        self.state.lock().customers.insert(customer.id, customer);
    }

    /// Add or replace an account (for setup).
    pub fn insert_account(&self, account: CustomerAccount) {
        self.state.lock().accounts.insert(account.id(), account);
    }

    /// Add or replace a holding (for setup).
    pub fn insert_holding(&self, holding: CustomerAsset) {
        self.state
            .lock()
            .holdings
            .insert((holding.customer_id(), holding.asset_id()), holding);
    }

    /// Copy of the committed state.
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.state.lock().clone()
    }
}

impl UnitOfWork for InMemoryStore {
    fn transact<T, F>(&self, work: F) -> Result<T, EngineError>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T, EngineError>,
    {
        let mut committed = self.state.lock();
        let mut unit = StagedUnit::new(&committed);
        let result = work(&mut unit)?;
        let changes = unit.changes;
        committed.apply(changes);
        Ok(result)
    }
}

impl StoreState {
    /// Committed orders.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Committed executions.
    pub fn executions(&self) -> impl Iterator<Item = &OrderExecution> {
        self.executions.values()
    }

    /// Committed accounts.
    pub fn accounts(&self) -> impl Iterator<Item = &CustomerAccount> {
        self.accounts.values()
    }

    /// Committed holdings.
    pub fn holdings(&self) -> impl Iterator<Item = &CustomerAsset> {
        self.holdings.values()
    }

    /// Ledger rows, oldest first.
    pub fn ledger(&self) -> &[AccountTransaction] {
        &self.ledger
    }

    fn apply(&mut self, changes: Changes) {
        self.orders.extend(changes.orders);
        self.executions.extend(changes.executions);
        self.accounts.extend(changes.accounts);
        for (key, holding) in changes.holdings {
            match holding {
                Some(holding) => {
                    self.holdings.insert(key, holding);
                }
                None => {
                    self.holdings.remove(&key);
                }
            }
        }
        self.ledger.extend(changes.ledger);
        self.last_order_id = changes.last_order_id;
        self.last_execution_id = changes.last_execution_id;
        self.last_transaction_id = changes.last_transaction_id;
    }
}

/// Rows written by one unit. A `None` holding is a delete.
#[derive(Debug, Default)]
struct Changes {
    orders: BTreeMap<OrderId, Order>,
    executions: BTreeMap<ExecutionId, OrderExecution>,
    accounts: BTreeMap<AccountId, CustomerAccount>,
    holdings: BTreeMap<HoldingKey, Option<CustomerAsset>>,
    ledger: Vec<AccountTransaction>,
    last_order_id: u64,
    last_execution_id: u64,
    last_transaction_id: u64,
}

/// The view one unit of work reads and writes through.
struct StagedUnit<'a> {
    base: &'a StoreState,
    changes: Changes,
}

impl<'a> StagedUnit<'a> {
    fn new(base: &'a StoreState) -> Self {
        Self {
            base,
            changes: Changes {
                last_order_id: base.last_order_id,
                last_execution_id: base.last_execution_id,
                last_transaction_id: base.last_transaction_id,
                ..Changes::default()
            },
        }
    }

    fn order(&self, id: OrderId) -> Option<&Order> {
        self.changes.orders.get(&id).or_else(|| self.base.orders.get(&id))
    }

    fn execution(&self, id: ExecutionId) -> Option<&OrderExecution> {
        self.changes
            .executions
            .get(&id)
            .or_else(|| self.base.executions.get(&id))
    }

    fn account(&self, id: AccountId) -> Option<&CustomerAccount> {
        self.changes
            .accounts
            .get(&id)
            .or_else(|| self.base.accounts.get(&id))
    }

    fn holding(&self, key: &HoldingKey) -> Option<&CustomerAsset> {
        match self.changes.holdings.get(key) {
            Some(staged) => staged.as_ref(),
            None => self.base.holdings.get(key),
        }
    }

    /// Orders in id order, staged rows shadowing committed ones.
    fn all_orders(&self) -> impl Iterator<Item = &Order> {
        merged(&self.base.orders, &self.changes.orders)
    }

    fn all_executions(&self) -> impl Iterator<Item = &OrderExecution> {
        merged(&self.base.executions, &self.changes.executions)
    }

    fn all_ledger_rows(&self) -> impl Iterator<Item = &AccountTransaction> {
        self.base.ledger.iter().chain(&self.changes.ledger)
    }
}

fn merged<'m, K: Ord, V>(
    base: &'m BTreeMap<K, V>,
    staged: &'m BTreeMap<K, V>,
) -> impl Iterator<Item = &'m V> {
    let mut view: BTreeMap<&K, &V> = base.iter().collect();
    view.extend(staged.iter());
    view.into_values()
}

// ============================================================================
// Orders and executions
// ============================================================================

impl OrderRepository for StagedUnit<'_> {
    fn next_order_id(&mut self) -> OrderId {
        self.changes.last_order_id += 1;
        OrderId::new(self.changes.last_order_id)
    }

    fn insert_order(&mut self, order: &Order) -> Result<(), StorageError> {
        if self.order(order.id()).is_some() {
            return Err(StorageError::Duplicate {
                entity: "Order",
                id: order.id().to_string(),
            });
        }
        self.changes.orders.insert(order.id(), order.clone());
        Ok(())
    }

    fn update_order(&mut self, order: &mut Order) -> Result<(), StorageError> {
        let stored = self.order(order.id()).ok_or_else(|| StorageError::Missing {
            entity: "Order",
            id: order.id().to_string(),
        })?;
        if stored.version() != order.version() {
            return Err(StorageError::VersionConflict {
                entity: "Order",
                id: order.id().to_string(),
                expected: order.version(),
                actual: stored.version(),
            });
        }
        order.advance_version();
        self.changes.orders.insert(order.id(), order.clone());
        Ok(())
    }

    fn find_order(&self, id: OrderId) -> Result<Option<Order>, StorageError> {
        Ok(self.order(id).cloned())
    }

    fn find_open_orders(
        &self,
        asset_id: AssetId,
        side: OrderSide,
    ) -> Result<Vec<Order>, StorageError> {
        Ok(self
            .all_orders()
            .filter(|o| o.asset_id() == asset_id && o.side() == side && o.is_open())
            .cloned()
            .collect())
    }

    fn find_orders_by_status(&self, statuses: &[OrderStatus]) -> Result<Vec<Order>, StorageError> {
        Ok(self
            .all_orders()
            .filter(|o| statuses.contains(&o.status()))
            .cloned()
            .collect())
    }

    fn find_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError> {
        let mut orders: Vec<Order> = self
            .all_orders()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(orders)
    }
}

impl ExecutionRepository for StagedUnit<'_> {
    fn next_execution_id(&mut self) -> ExecutionId {
        self.changes.last_execution_id += 1;
        ExecutionId::new(self.changes.last_execution_id)
    }

    fn insert_execution(&mut self, execution: &OrderExecution) -> Result<(), StorageError> {
        if self.execution(execution.id()).is_some() {
            return Err(StorageError::Duplicate {
                entity: "OrderExecution",
                id: execution.id().to_string(),
            });
        }
        self.changes
            .executions
            .insert(execution.id(), execution.clone());
        Ok(())
    }

    fn update_execution(&mut self, execution: &OrderExecution) -> Result<(), StorageError> {
        if self.execution(execution.id()).is_none() {
            return Err(StorageError::Missing {
                entity: "OrderExecution",
                id: execution.id().to_string(),
            });
        }
        self.changes
            .executions
            .insert(execution.id(), execution.clone());
        Ok(())
    }

    fn find_execution(&self, id: ExecutionId) -> Result<Option<OrderExecution>, StorageError> {
        Ok(self.execution(id).cloned())
    }

    fn find_executions_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderExecution>, StorageError> {
        Ok(self
            .all_executions()
            .filter(|e| e.order_id() == order_id)
            .cloned()
            .collect())
    }

    fn find_unsettled_due(&self, date: NaiveDate) -> Result<Vec<OrderExecution>, StorageError> {
        let mut due: Vec<OrderExecution> = self
            .all_executions()
            .filter(|e| !e.is_settled() && e.settlement_date() <= date)
            .cloned()
            .collect();
        due.sort_by_key(|e| (e.settlement_date(), e.id()));
        Ok(due)
    }
}

// ============================================================================
// Portfolio
// ============================================================================

impl AccountRepository for StagedUnit<'_> {
    fn find_account(&self, id: AccountId) -> Result<Option<CustomerAccount>, StorageError> {
        Ok(self.account(id).cloned())
    }

    fn find_all_accounts(&self) -> Result<Vec<CustomerAccount>, StorageError> {
        Ok(merged(&self.base.accounts, &self.changes.accounts)
            .cloned()
            .collect())
    }

    fn update_account(&mut self, account: &mut CustomerAccount) -> Result<(), StorageError> {
        let stored = self.account(account.id()).ok_or_else(|| StorageError::Missing {
            entity: "CustomerAccount",
            id: account.id().to_string(),
        })?;
        if stored.version() != account.version() {
            return Err(StorageError::VersionConflict {
                entity: "CustomerAccount",
                id: account.id().to_string(),
                expected: account.version(),
                actual: stored.version(),
            });
        }
        account.advance_version();
        self.changes.accounts.insert(account.id(), account.clone());
        Ok(())
    }
}

impl HoldingRepository for StagedUnit<'_> {
    fn find_holding(
        &self,
        customer_id: CustomerId,
        asset_id: AssetId,
    ) -> Result<Option<CustomerAsset>, StorageError> {
        Ok(self.holding(&(customer_id, asset_id)).cloned())
    }

    fn find_all_holdings(&self) -> Result<Vec<CustomerAsset>, StorageError> {
        let mut view: BTreeMap<&HoldingKey, &CustomerAsset> = self.base.holdings.iter().collect();
        for (key, staged) in &self.changes.holdings {
            match staged {
                Some(holding) => {
                    view.insert(key, holding);
                }
                None => {
                    view.remove(key);
                }
            }
        }
        Ok(view.into_values().cloned().collect())
    }

    fn save_holding(&mut self, holding: &mut CustomerAsset) -> Result<(), StorageError> {
        let key = (holding.customer_id(), holding.asset_id());
        let stored_version = self.holding(&key).map_or(0, CustomerAsset::version);
        if stored_version != holding.version() {
            return Err(StorageError::VersionConflict {
                entity: "CustomerAsset",
                id: format!("{}/{}", key.0, key.1),
                expected: holding.version(),
                actual: stored_version,
            });
        }
        holding.advance_version();
        self.changes.holdings.insert(key, Some(holding.clone()));
        Ok(())
    }

    fn delete_holding(
        &mut self,
        customer_id: CustomerId,
        asset_id: AssetId,
    ) -> Result<(), StorageError> {
        self.changes.holdings.insert((customer_id, asset_id), None);
        Ok(())
    }
}

impl LedgerRepository for StagedUnit<'_> {
    fn next_transaction_id(&mut self) -> TransactionId {
        self.changes.last_transaction_id += 1;
        TransactionId::new(self.changes.last_transaction_id)
    }

    fn append_transaction(&mut self, row: &AccountTransaction) -> Result<(), StorageError> {
        self.changes.ledger.push(row.clone());
        Ok(())
    }

    fn find_transactions_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<AccountTransaction>, StorageError> {
        Ok(self
            .all_ledger_rows()
            .filter(|row| row.order_id == Some(order_id))
            .cloned()
            .collect())
    }

    fn find_transactions_by_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<AccountTransaction>, StorageError> {
        Ok(self
            .all_ledger_rows()
            .filter(|row| row.account_id == account_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Reference data
// ============================================================================

impl AssetRepository for StagedUnit<'_> {
    fn find_asset(&self, id: AssetId) -> Result<Option<Asset>, StorageError> {
        Ok(self.base.assets.get(&id).cloned())
    }

    fn find_asset_by_code(&self, bist_code: &str) -> Result<Option<Asset>, StorageError> {
        Ok(self
            .base
            .assets
            .values()
            .find(|a| a.bist_code.eq_ignore_ascii_case(bist_code))
            .cloned())
    }
}

impl CustomerRepository for StagedUnit<'_> {
    fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, StorageError> {
        Ok(self.base.customers.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::{Lots, Money};
    use rust_decimal_macros::dec;

    fn store_with_account() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_account(CustomerAccount::open(
            AccountId::new(1),
            CustomerId::new(1),
            "ACC-1",
            Money::new(dec!(100)),
        ));
        store
    }

    #[test]
    fn failed_unit_leaves_nothing_behind() {
        let store = store_with_account();
        let result: Result<(), EngineError> = store.transact(|tx| {
            let mut account = tx.find_account(AccountId::new(1))?.unwrap();
            account.block(Money::new(dec!(40)))?;
            tx.update_account(&mut account)?;
            Err(EngineError::validation(crate::error::ErrorCode::InvalidRequest, "abort"))
        });
        assert!(result.is_err());
        let account = store.snapshot().accounts().next().cloned().unwrap();
        assert_eq!(account.blocked_balance(), Money::ZERO);
        assert_eq!(account.version(), 0);
    }

    #[test]
    fn stale_version_is_a_conflict() {
        let store = store_with_account();
        let stale = store
            .transact(|tx| Ok(tx.find_account(AccountId::new(1))?.unwrap()))
            .unwrap();

        store
            .transact(|tx| {
                let mut fresh = tx.find_account(AccountId::new(1))?.unwrap();
                fresh.credit(Money::new(dec!(1)))?;
                tx.update_account(&mut fresh)?;
                Ok(())
            })
            .unwrap();

        let err = store
            .transact(|tx| {
                let mut stale = stale.clone();
                tx.update_account(&mut stale)?;
                Ok(())
            })
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn unit_reads_its_own_writes_before_commit() {
        let store = store_with_account();
        let customer = CustomerId::new(1);
        let asset = AssetId::new(7);
        store.insert_holding(CustomerAsset::with_lots(
            customer,
            asset,
            Lots::new(10),
            Money::new(dec!(5)),
        ));

        store
            .transact(|tx| {
                tx.delete_holding(customer, asset)?;
                assert!(tx.find_holding(customer, asset)?.is_none());
                assert!(tx.find_all_holdings()?.is_empty());

                let mut account = tx.find_account(AccountId::new(1))?.unwrap();
                account.credit(Money::new(dec!(5)))?;
                tx.update_account(&mut account)?;
                assert_eq!(tx.find_all_accounts()?[0].version(), 1);
                Ok(())
            })
            .unwrap();

        let state = store.snapshot();
        assert_eq!(state.holdings().count(), 0);
        assert_eq!(state.accounts().next().unwrap().version(), 1);
    }

    #[test]
    fn ids_are_sequential_within_committed_units() {
        let store = InMemoryStore::new();
        let first = store.transact(|tx| Ok(tx.next_order_id())).unwrap();
        let second = store.transact(|tx| Ok(tx.next_order_id())).unwrap();
        assert_eq!(first.value() + 1, second.value());
    }
}
