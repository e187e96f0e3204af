//! Portfolio Bounded Context
//!
//! Customer cash accounts, asset holdings, the append-only account ledger,
//! and the reference data (assets, customers) they point at.

pub mod account_transaction;
pub mod customer_account;
pub mod customer_asset;
pub mod errors;
pub mod reference;
pub mod repository;

pub use account_transaction::{AccountTransaction, NewAccountTransaction, TransactionKind};
pub use customer_account::CustomerAccount;
pub use customer_asset::CustomerAsset;
pub use errors::LedgerError;
pub use reference::{Asset, Customer};
pub use repository::{
    AccountRepository, AssetRepository, CustomerRepository, HoldingRepository, LedgerRepository,
};
