//! Portfolio Ledger
//!
//! Every cash and holding mutation caused by orders and executions goes
//! through here, inside the caller's unit of work. Cash movements leave an
//! append-only `AccountTransaction` row.
//!
//! Per BUY order the ledger tracks:
//!
//! - outstanding block: ORDER_BLOCKED - ORDER_UNBLOCKED - TRADE_SETTLEMENT_DEBIT
//! - pending cost: gross + commission of the order's unsettled executions
//!
//! Outstanding minus pending is what is still reserved for the open remainder.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::Transaction;
use crate::domain::order_execution::{Order, OrderExecution, OrderSide};
use crate::domain::portfolio::{
    AccountTransaction, CustomerAccount, CustomerAsset, LedgerError, NewAccountTransaction,
    TransactionKind,
};
use crate::domain::shared::{AccountId, DomainError, ExecutionId, Lots, Money, OrderId, Timestamp};
use crate::error::EngineError;

/// When bought lots become free and sold lots leave the holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPolicy {
    /// With controls active, executions settle on their settlement date.
    /// Without, both sides settle at execution time.
    pub controls_active: bool,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            controls_active: true,
        }
    }
}

/// What a release put back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Released {
    /// Cash returned to available balance.
    pub cash: Money,
    /// Lots returned to available holding.
    pub lots: Lots,
}

/// Summary of an administrative override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideReport {
    /// Executions settled early.
    pub settled: usize,
    /// Accounts whose blocked balance was zeroed.
    pub accounts_released: usize,
    /// Holdings whose blocked lots were zeroed.
    pub holdings_released: usize,
}

/// Reservations, settlement and funding against customer accounts and holdings.
#[derive(Debug, Clone, Default)]
pub struct PortfolioLedger {
    policy: SettlementPolicy,
}

impl PortfolioLedger {
    /// Create a ledger with the given settlement policy.
    #[must_use]
    pub const fn new(policy: SettlementPolicy) -> Self {
        Self { policy }
    }

    /// Active settlement policy.
    #[must_use]
    pub const fn policy(&self) -> SettlementPolicy {
        self.policy
    }

    /// Commission on a gross amount, rounded to ledger precision.
    #[must_use]
    pub fn commission(gross: Money, rate: Decimal) -> Money {
        gross.times_rate(rate).round_ledger()
    }

    /// Commission on the next fill of an order that has already traded
    /// `traded` gross.
    ///
    /// Charged as the increase in the rounded commission on the running
    /// gross, so an order's fills add up to the commission on its total and
    /// never to more than its reservation covered.
    #[must_use]
    pub fn fill_commission(traded: Money, gross: Money, rate: Decimal) -> Money {
        Self::commission(traded + gross, rate) - Self::commission(traded, rate)
    }

    /// Cash reserved for a BUY: gross plus commission.
    ///
    /// # Errors
    ///
    /// `InvalidValue` if the amount does not fit a ledger decimal.
    pub fn buy_reservation(price: Money, lots: Lots, rate: Decimal) -> Result<Money, DomainError> {
        let out_of_range = || {
            DomainError::invalid_value(
                "order_value",
                format!("{price} x {lots} lots is too large to reserve"),
            )
        };
        let gross = price.checked_times_lots(lots).ok_or_else(out_of_range)?;
        gross
            .checked_add(Self::commission(gross, rate))
            .ok_or_else(out_of_range)
    }

    // ========================================================================
    // Reservations
    // ========================================================================

    /// Block cash for the open remainder of a BUY order at its locked price.
    pub fn block_balance_for_buy_order(
        &self,
        tx: &mut dyn Transaction,
        order: &Order,
        rate: Decimal,
        now: Timestamp,
    ) -> Result<Money, EngineError> {
        let amount = Self::buy_reservation(order.locked_price(), order.remaining_lots(), rate)?;
        let mut account = load_account(tx, order.customer_account_id())?;
        account.ensure_active()?;
        account.block(amount)?;
        tx.update_account(&mut account)?;
        write_row(
            tx,
            &account,
            NewAccountTransaction {
                kind: TransactionKind::OrderBlocked,
                amount,
                order_id: Some(order.id()),
                execution_id: None,
                description: format!("Block for BUY order {}", order.code()),
            },
            now,
        )?;

        tracing::debug!(
            order_id = %order.id(),
            account_id = %account.id(),
            amount = %amount,
            "Blocked balance for buy order"
        );
        Ok(amount)
    }

    /// Block the open remainder of a SELL order out of the customer's holding.
    pub fn block_asset_for_sell_order(
        &self,
        tx: &mut dyn Transaction,
        order: &Order,
    ) -> Result<Lots, EngineError> {
        let lots = order.remaining_lots();
        load_account(tx, order.customer_account_id())?.ensure_active()?;
        let mut holding = tx
            .find_holding(order.customer_id(), order.asset_id())?
            .ok_or(LedgerError::InsufficientAvailableAsset {
                customer_id: order.customer_id(),
                asset_id: order.asset_id(),
                required: lots,
                available: Lots::ZERO,
            })?;
        holding.block(lots)?;
        tx.save_holding(&mut holding)?;

        tracing::debug!(
            order_id = %order.id(),
            customer_id = %order.customer_id(),
            lots = %lots,
            "Blocked lots for sell order"
        );
        Ok(lots)
    }

    /// Reserve whatever an order needs for its current open remainder.
    pub fn reserve_for_order(
        &self,
        tx: &mut dyn Transaction,
        order: &Order,
        rate: Decimal,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        match order.side() {
            OrderSide::Buy => self
                .block_balance_for_buy_order(tx, order, rate, now)
                .map(drop),
            OrderSide::Sell => self.block_asset_for_sell_order(tx, order).map(drop),
        }
    }

    /// Release the reservation still held for an order's unfilled remainder.
    ///
    /// BUY: outstanding block minus the cost of unsettled executions.
    /// SELL: the remaining lots. Filled lots stay blocked until settlement.
    pub fn release_block_for_cancelled_order(
        &self,
        tx: &mut dyn Transaction,
        order: &Order,
        now: Timestamp,
    ) -> Result<Released, EngineError> {
        match order.side() {
            OrderSide::Buy => {
                let reserved = self.reserved_for_remainder(tx, order.id())?;
                if !reserved.is_positive() {
                    return Ok(Released::default());
                }
                let cash = self.unblock_cash(
                    tx,
                    order.customer_account_id(),
                    reserved,
                    Some(order.id()),
                    format!("Release for order {}", order.code()),
                    now,
                )?;
                Ok(Released {
                    cash,
                    lots: Lots::ZERO,
                })
            }
            OrderSide::Sell => {
                let lots = order.remaining_lots();
                if lots.is_zero() {
                    return Ok(Released::default());
                }
                let Some(mut holding) = tx.find_holding(order.customer_id(), order.asset_id())?
                else {
                    return Ok(Released::default());
                };
                let released = holding.unblock(lots)?;
                tx.save_holding(&mut holding)?;
                Ok(Released {
                    cash: Money::ZERO,
                    lots: released,
                })
            }
        }
    }

    /// Cash still blocked against an order: blocked - unblocked - settled debits.
    pub fn outstanding_block(
        &self,
        tx: &dyn Transaction,
        order_id: OrderId,
    ) -> Result<Money, EngineError> {
        let rows = tx.find_transactions_by_order(order_id)?;
        Ok(rows
            .iter()
            .map(|row| match row.kind {
                TransactionKind::OrderBlocked => row.amount,
                TransactionKind::OrderUnblocked | TransactionKind::TradeSettlementDebit => {
                    -row.amount
                }
                _ => Money::ZERO,
            })
            .sum())
    }

    /// Cost of an order's executions that have not settled yet.
    pub fn pending_settlement_cost(
        &self,
        tx: &dyn Transaction,
        order_id: OrderId,
    ) -> Result<Money, EngineError> {
        Ok(tx
            .find_executions_by_order(order_id)?
            .iter()
            .filter(|e| !e.is_settled())
            .map(OrderExecution::buy_settlement_debit)
            .sum())
    }

    fn reserved_for_remainder(
        &self,
        tx: &dyn Transaction,
        order_id: OrderId,
    ) -> Result<Money, EngineError> {
        let outstanding = self.outstanding_block(tx, order_id)?;
        let pending = self.pending_settlement_cost(tx, order_id)?;
        Ok((outstanding - pending).floor_zero())
    }

    /// Make sure a BUY order's reservation covers a fill costing `cost`.
    ///
    /// A fill below the locked price needs nothing extra. Any shortfall is
    /// blocked from available balance; if that is not possible the whole
    /// unit of work fails with an insufficient-balance error.
    pub fn reserve_fill_cost(
        &self,
        tx: &mut dyn Transaction,
        order: &Order,
        cost: Money,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let reserved = self.reserved_for_remainder(tx, order.id())?;
        let shortfall = cost - reserved;
        if !shortfall.is_positive() {
            return Ok(());
        }

        let mut account = load_account(tx, order.customer_account_id())?;
        account.block(shortfall)?;
        tx.update_account(&mut account)?;
        write_row(
            tx,
            &account,
            NewAccountTransaction {
                kind: TransactionKind::OrderBlocked,
                amount: shortfall,
                order_id: Some(order.id()),
                execution_id: None,
                description: format!("Top-up block for order {}", order.code()),
            },
            now,
        )?;
        tracing::info!(order_id = %order.id(), shortfall = %shortfall, "Topped up buy reservation");
        Ok(())
    }

    // ========================================================================
    // Execution effects
    // ========================================================================

    /// Credit bought lots to the holding, blocked until settlement.
    pub fn block_asset_for_buy_execution(
        &self,
        tx: &mut dyn Transaction,
        order: &Order,
        execution: &OrderExecution,
    ) -> Result<(), EngineError> {
        let mut holding = tx
            .find_holding(order.customer_id(), order.asset_id())?
            .unwrap_or_else(|| CustomerAsset::empty(order.customer_id(), order.asset_id()));
        holding.receive(execution.lots(), execution.price(), true)?;
        tx.save_holding(&mut holding)?;
        Ok(())
    }

    /// Credit bought lots and settle the execution at once.
    pub fn increase_holdings_immediately(
        &self,
        tx: &mut dyn Transaction,
        order: &Order,
        execution: &mut OrderExecution,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.block_asset_for_buy_execution(tx, order, execution)?;
        self.settle_buy_transaction(tx, order, execution, now)?;
        Ok(())
    }

    /// Check the sold lots are held blocked; they leave at settlement.
    pub fn apply_sell_execution_hold(
        &self,
        tx: &mut dyn Transaction,
        order: &Order,
        execution: &OrderExecution,
    ) -> Result<(), EngineError> {
        let blocked = tx
            .find_holding(order.customer_id(), order.asset_id())?
            .map_or(Lots::ZERO, |h| h.blocked_lots());
        if blocked < execution.lots() {
            return Err(LedgerError::InsufficientBlockedAsset {
                customer_id: order.customer_id(),
                asset_id: order.asset_id(),
                required: execution.lots(),
                blocked,
            }
            .into());
        }
        Ok(())
    }

    // ========================================================================
    // Settlement
    // ========================================================================

    /// Settle one execution by ID, dispatching on its order's side.
    ///
    /// Returns `false` when the execution had already settled.
    pub fn settle_execution(
        &self,
        tx: &mut dyn Transaction,
        execution_id: ExecutionId,
        now: Timestamp,
    ) -> Result<bool, EngineError> {
        let mut execution = tx
            .find_execution(execution_id)?
            .ok_or_else(|| EngineError::not_found("OrderExecution", execution_id))?;
        if execution.is_settled() {
            return Ok(false);
        }
        let order = tx
            .find_order(execution.order_id())?
            .ok_or_else(|| EngineError::not_found("Order", execution.order_id()))?;
        match order.side() {
            OrderSide::Buy => self.settle_buy_transaction(tx, &order, &mut execution, now),
            OrderSide::Sell => self.settle_sell_transaction(tx, &order, &mut execution, now),
        }
    }

    /// Pay for a buy execution and free its lots.
    ///
    /// Releases the order's residual block once it is terminal and nothing
    /// else remains to settle. Returns `false` if already settled.
    pub fn settle_buy_transaction(
        &self,
        tx: &mut dyn Transaction,
        order: &Order,
        execution: &mut OrderExecution,
        now: Timestamp,
    ) -> Result<bool, EngineError> {
        if execution.is_settled() {
            return Ok(false);
        }

        let debit = execution.buy_settlement_debit();
        let mut account = load_account(tx, order.customer_account_id())?;
        account.unblock(debit)?;
        account.debit(debit)?;
        write_row(
            tx,
            &account,
            NewAccountTransaction {
                kind: TransactionKind::TradeSettlementDebit,
                amount: debit,
                order_id: Some(order.id()),
                execution_id: Some(execution.id()),
                description: format!("Settlement of BUY execution {}", execution.id()),
            },
            now,
        )?;

        if let Some(mut holding) = tx.find_holding(order.customer_id(), order.asset_id())? {
            if !holding.blocked_lots().is_zero() {
                holding.unblock(execution.lots())?;
                tx.save_holding(&mut holding)?;
            }
        }

        execution.mark_settled(now)?;
        tx.update_execution(execution)?;

        if order.status().is_terminal() {
            let unsettled = tx
                .find_executions_by_order(order.id())?
                .iter()
                .any(|e| !e.is_settled());
            if !unsettled {
                let residual = self.outstanding_block(tx, order.id())?;
                if residual.is_positive() {
                    let released = account.unblock(residual)?;
                    if released.is_positive() {
                        write_row(
                            tx,
                            &account,
                            NewAccountTransaction {
                                kind: TransactionKind::OrderUnblocked,
                                amount: released,
                                order_id: Some(order.id()),
                                execution_id: None,
                                description: format!("Residual release for order {}", order.code()),
                            },
                            now,
                        )?;
                    }
                }
            }
        }

        tx.update_account(&mut account)?;
        tracing::info!(
            execution_id = %execution.id(),
            order_id = %order.id(),
            debit = %debit,
            "Settled buy execution"
        );
        Ok(true)
    }

    /// Deliver sold lots and credit the proceeds. Returns `false` if already settled.
    pub fn settle_sell_transaction(
        &self,
        tx: &mut dyn Transaction,
        order: &Order,
        execution: &mut OrderExecution,
        now: Timestamp,
    ) -> Result<bool, EngineError> {
        if execution.is_settled() {
            return Ok(false);
        }

        let mut holding = tx
            .find_holding(order.customer_id(), order.asset_id())?
            .ok_or(LedgerError::InsufficientBlockedAsset {
                customer_id: order.customer_id(),
                asset_id: order.asset_id(),
                required: execution.lots(),
                blocked: Lots::ZERO,
            })?;
        holding.deliver(execution.lots())?;
        if holding.is_empty() {
            tx.delete_holding(order.customer_id(), order.asset_id())?;
        } else {
            tx.save_holding(&mut holding)?;
        }

        let credit = execution.sell_settlement_credit();
        if credit.is_positive() {
            let mut account = load_account(tx, order.customer_account_id())?;
            account.credit(credit)?;
            tx.update_account(&mut account)?;
            write_row(
                tx,
                &account,
                NewAccountTransaction {
                    kind: TransactionKind::TradeSettlementCredit,
                    amount: credit,
                    order_id: Some(order.id()),
                    execution_id: Some(execution.id()),
                    description: format!("Settlement of SELL execution {}", execution.id()),
                },
                now,
            )?;
        }

        execution.mark_settled(now)?;
        tx.update_execution(execution)?;
        tracing::info!(
            execution_id = %execution.id(),
            order_id = %order.id(),
            credit = %credit,
            "Settled sell execution"
        );
        Ok(true)
    }

    /// Settle everything now and drop every remaining block.
    pub fn release_all_blocks_for_override(
        &self,
        tx: &mut dyn Transaction,
        now: Timestamp,
    ) -> Result<OverrideReport, EngineError> {
        let mut report = OverrideReport::default();

        for execution in tx.find_unsettled_due(NaiveDate::MAX)? {
            if self.settle_execution(tx, execution.id(), now)? {
                report.settled += 1;
            }
        }

        for mut account in tx.find_all_accounts()? {
            let released = account.unblock_all();
            if released.is_positive() {
                tx.update_account(&mut account)?;
                write_row(
                    tx,
                    &account,
                    NewAccountTransaction {
                        kind: TransactionKind::OrderUnblocked,
                        amount: released,
                        order_id: None,
                        execution_id: None,
                        description: "Administrative override release".to_string(),
                    },
                    now,
                )?;
                report.accounts_released += 1;
            }
        }

        for mut holding in tx.find_all_holdings()? {
            if !holding.unblock_all().is_zero() {
                tx.save_holding(&mut holding)?;
                report.holdings_released += 1;
            }
        }

        tracing::warn!(
            settled = report.settled,
            accounts = report.accounts_released,
            holdings = report.holdings_released,
            "Released all blocks by administrative override"
        );
        Ok(report)
    }

    // ========================================================================
    // Funding
    // ========================================================================

    /// Add cash to an active account.
    pub fn deposit(
        &self,
        tx: &mut dyn Transaction,
        account_id: AccountId,
        amount: Money,
        now: Timestamp,
    ) -> Result<CustomerAccount, EngineError> {
        let mut account = load_account(tx, account_id)?;
        account.ensure_active()?;
        account.credit(amount)?;
        tx.update_account(&mut account)?;
        write_row(
            tx,
            &account,
            NewAccountTransaction {
                kind: TransactionKind::Deposit,
                amount,
                order_id: None,
                execution_id: None,
                description: "Deposit".to_string(),
            },
            now,
        )?;
        Ok(account)
    }

    /// Remove free cash from an active account.
    pub fn withdraw(
        &self,
        tx: &mut dyn Transaction,
        account_id: AccountId,
        amount: Money,
        now: Timestamp,
    ) -> Result<CustomerAccount, EngineError> {
        let mut account = load_account(tx, account_id)?;
        account.ensure_active()?;
        account.debit(amount)?;
        tx.update_account(&mut account)?;
        write_row(
            tx,
            &account,
            NewAccountTransaction {
                kind: TransactionKind::Withdrawal,
                amount,
                order_id: None,
                execution_id: None,
                description: "Withdrawal".to_string(),
            },
            now,
        )?;
        Ok(account)
    }

    fn unblock_cash(
        &self,
        tx: &mut dyn Transaction,
        account_id: AccountId,
        amount: Money,
        order_id: Option<OrderId>,
        description: String,
        now: Timestamp,
    ) -> Result<Money, EngineError> {
        let mut account = load_account(tx, account_id)?;
        let released = account.unblock(amount)?;
        if !released.is_positive() {
            return Ok(Money::ZERO);
        }
        tx.update_account(&mut account)?;
        write_row(
            tx,
            &account,
            NewAccountTransaction {
                kind: TransactionKind::OrderUnblocked,
                amount: released,
                order_id,
                execution_id: None,
                description,
            },
            now,
        )?;
        Ok(released)
    }
}

/// Load an account or fail with `NotFound`.
pub(crate) fn load_account(
    tx: &dyn Transaction,
    account_id: AccountId,
) -> Result<CustomerAccount, EngineError> {
    tx.find_account(account_id)?
        .ok_or_else(|| EngineError::not_found("CustomerAccount", account_id))
}

fn write_row(
    tx: &mut dyn Transaction,
    account: &CustomerAccount,
    new: NewAccountTransaction,
    now: Timestamp,
) -> Result<(), EngineError> {
    let id = tx.next_transaction_id();
    let row = AccountTransaction::record(id, account.id(), account.balance(), new, now);
    tx.append_transaction(&row)?;
    Ok(())
}
