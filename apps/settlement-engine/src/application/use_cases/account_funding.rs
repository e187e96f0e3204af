//! Account Funding Use Case
//!
//! Deposits and withdrawals of customer cash.

use std::sync::Arc;

use tracing::info;

use crate::application::ports::{ClockPort, UnitOfWork};
use crate::application::services::PortfolioLedger;
use crate::domain::portfolio::CustomerAccount;
use crate::domain::shared::{AccountId, Money, Timestamp};
use crate::error::EngineError;

/// Use case for moving cash in and out of customer accounts.
pub struct AccountFundingUseCase<U, C>
where
    U: UnitOfWork,
    C: ClockPort,
{
    uow: Arc<U>,
    ledger: Arc<PortfolioLedger>,
    clock: Arc<C>,
}

impl<U, C> AccountFundingUseCase<U, C>
where
    U: UnitOfWork,
    C: ClockPort,
{
    /// Create a new AccountFundingUseCase.
    pub const fn new(uow: Arc<U>, ledger: Arc<PortfolioLedger>, clock: Arc<C>) -> Self {
        Self { uow, ledger, clock }
    }

    /// Add cash to an account.
    pub fn deposit(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> Result<CustomerAccount, EngineError> {
        let now = Timestamp::new(self.clock.now());
        let account = self
            .uow
            .transact(|tx| self.ledger.deposit(tx, account_id, amount, now))?;
        info!(account_id = %account_id, amount = %amount, balance = %account.balance(), "Deposit");
        Ok(account)
    }

    /// Take free cash out of an account.
    pub fn withdraw(
        &self,
        account_id: AccountId,
        amount: Money,
    ) -> Result<CustomerAccount, EngineError> {
        let now = Timestamp::new(self.clock.now());
        let account = self
            .uow
            .transact(|tx| self.ledger.withdraw(tx, account_id, amount, now))?;
        info!(account_id = %account_id, amount = %amount, balance = %account.balance(), "Withdrawal");
        Ok(account)
    }
}
