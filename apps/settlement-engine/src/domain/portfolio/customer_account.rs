//! Customer cash account.
//!
//! Invariant: `0 <= blocked_balance <= balance` after every operation.

use serde::{Deserialize, Serialize};

use super::LedgerError;
use crate::domain::shared::{AccountId, CustomerId, Money};

/// A customer's cash account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAccount {
    id: AccountId,
    customer_id: CustomerId,
    account_number: String,
    balance: Money,
    blocked_balance: Money,
    active: bool,
    version: u64,
}

impl CustomerAccount {
    /// Open an account with an initial balance and nothing blocked.
    #[must_use]
    pub fn open(
        id: AccountId,
        customer_id: CustomerId,
        account_number: impl Into<String>,
        balance: Money,
    ) -> Self {
        Self {
            id,
            customer_id,
            account_number: account_number.into(),
            balance: balance.floor_zero(),
            blocked_balance: Money::ZERO,
            active: true,
            version: 0,
        }
    }

    /// Account ID.
    #[must_use]
    pub const fn id(&self) -> AccountId {
        self.id
    }

    /// Owning customer.
    #[must_use]
    pub const fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Account number.
    #[must_use]
    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    /// Total cash.
    #[must_use]
    pub const fn balance(&self) -> Money {
        self.balance
    }

    /// Cash reserved against open orders and unsettled buys.
    #[must_use]
    pub const fn blocked_balance(&self) -> Money {
        self.blocked_balance
    }

    /// Cash free for new reservations or withdrawal.
    #[must_use]
    pub fn available_balance(&self) -> Money {
        self.balance - self.blocked_balance
    }

    /// Whether the account accepts mutations.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Optimistic concurrency version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Fail unless the account is active.
    pub fn ensure_active(&self) -> Result<(), LedgerError> {
        if self.active {
            Ok(())
        } else {
            Err(LedgerError::InactiveAccount { account_id: self.id })
        }
    }

    /// Suspend or reinstate the account.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Reserve `amount` of free cash.
    pub fn block(&mut self, amount: Money) -> Result<(), LedgerError> {
        Self::validate(amount, "block_amount")?;
        let available = self.available_balance();
        if available < amount {
            return Err(LedgerError::InsufficientAvailableBalance {
                account_id: self.id,
                required: amount,
                available,
            });
        }
        self.blocked_balance = self.blocked_balance + amount;
        Ok(())
    }

    /// Release up to `amount` of blocked cash; returns what was released.
    pub fn unblock(&mut self, amount: Money) -> Result<Money, LedgerError> {
        Self::validate(amount, "unblock_amount")?;
        let released = amount.min(self.blocked_balance);
        self.blocked_balance = self.blocked_balance - released;
        Ok(released)
    }

    /// Release everything blocked; returns the released amount.
    pub fn unblock_all(&mut self) -> Money {
        let released = self.blocked_balance;
        self.blocked_balance = Money::ZERO;
        released
    }

    /// Add cash.
    pub fn credit(&mut self, amount: Money) -> Result<(), LedgerError> {
        Self::validate(amount, "credit_amount")?;
        self.balance = self.balance + amount;
        Ok(())
    }

    /// Remove free cash.
    pub fn debit(&mut self, amount: Money) -> Result<(), LedgerError> {
        Self::validate(amount, "debit_amount")?;
        let available = self.available_balance();
        if available < amount {
            return Err(LedgerError::InsufficientAvailableBalance {
                account_id: self.id,
                required: amount,
                available,
            });
        }
        self.balance = self.balance - amount;
        Ok(())
    }

    /// Advance the version after a successful compare-and-swap write.
    ///
    /// Called by storage adapters only.
    pub const fn advance_version(&mut self) {
        self.version += 1;
    }

    fn validate(amount: Money, field: &str) -> Result<(), LedgerError> {
        amount
            .ensure_positive(field)
            .map_err(|e| LedgerError::invalid_amount(&e, field))
    }
}
