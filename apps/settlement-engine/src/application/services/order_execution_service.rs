//! Order Execution Service
//!
//! Records one fill against one order inside the caller's unit of work:
//! execution row, order fill and version bump, ledger effect, and the
//! `OrderExecutedEvent` to publish after commit.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::PortfolioLedger;
use crate::application::ports::Transaction;
use crate::domain::calendar::BusinessDayCalculator;
use crate::domain::order_execution::{
    Fill, NewExecution, Order, OrderExecutedEvent, OrderExecution, OrderSide,
};
use crate::domain::shared::{Lots, Money, Timestamp};
use crate::error::EngineError;

/// Result of executing one side of a fill.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    /// The stored execution, settled if the policy settles immediately.
    pub execution: OrderExecution,
    /// Event to publish once the unit of work commits.
    pub event: OrderExecutedEvent,
}

/// Side of a planned fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLeg {
    /// The order being matched.
    Incoming,
    /// The order resting in the book.
    Resting,
}

impl fmt::Display for MatchLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incoming => write!(f, "incoming"),
            Self::Resting => write!(f, "resting"),
        }
    }
}

/// A fill that failed on one of its two legs.
#[derive(Debug, Error)]
#[error("{leg} leg of the fill failed: {source}")]
pub struct MatchLegError {
    /// Which order the failure belongs to.
    pub leg: MatchLeg,
    /// What went wrong.
    pub source: EngineError,
}

/// Applies fills to orders.
#[derive(Debug, Clone)]
pub struct OrderExecutionService {
    ledger: Arc<PortfolioLedger>,
    calendar: Arc<BusinessDayCalculator>,
}

impl OrderExecutionService {
    /// Create the service.
    #[must_use]
    pub const fn new(ledger: Arc<PortfolioLedger>, calendar: Arc<BusinessDayCalculator>) -> Self {
        Self { ledger, calendar }
    }

    /// Execute `lots` of `order` at `price`.
    ///
    /// `today` is the exchange-local trade date; settlement lands
    /// `settlement_days` business days after it.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_single_order(
        &self,
        tx: &mut dyn Transaction,
        order: &mut Order,
        price: Money,
        lots: Lots,
        rate: Decimal,
        today: NaiveDate,
        now: Timestamp,
    ) -> Result<ExecutionRecord, EngineError> {
        let asset = tx
            .find_asset(order.asset_id())?
            .ok_or_else(|| EngineError::not_found("Asset", order.asset_id()))?;
        let customer_code = tx
            .find_customer(order.customer_id())?
            .map(|c| c.customer_code)
            .unwrap_or_default();

        let traded: Money = tx
            .find_executions_by_order(order.id())?
            .iter()
            .map(OrderExecution::gross_amount)
            .sum();
        let gross = price.times_lots(lots);
        let commission = PortfolioLedger::fill_commission(traded, gross, rate);
        let settlement_date = self
            .calendar
            .business_day_after(today, i64::from(asset.settlement_days))?;

        if order.side() == OrderSide::Buy {
            self.ledger
                .reserve_fill_cost(tx, order, gross + commission, now)?;
        }

        let mut execution = OrderExecution::new(NewExecution {
            id: tx.next_execution_id(),
            order_id: order.id(),
            lots,
            price,
            locked_price: order.locked_price(),
            commission,
            executed_at: now,
            settlement_date,
        });
        tx.insert_execution(&execution)?;

        let new_status = order.apply_fill(lots, now)?;
        tx.update_order(order)?;

        let immediate = !self.ledger.policy().controls_active;
        match (order.side(), immediate) {
            (OrderSide::Buy, false) => {
                self.ledger
                    .block_asset_for_buy_execution(tx, order, &execution)?;
            }
            (OrderSide::Buy, true) => {
                self.ledger
                    .increase_holdings_immediately(tx, order, &mut execution, now)?;
            }
            (OrderSide::Sell, false) => {
                self.ledger.apply_sell_execution_hold(tx, order, &execution)?;
            }
            (OrderSide::Sell, true) => {
                self.ledger
                    .settle_sell_transaction(tx, order, &mut execution, now)?;
            }
        }

        tracing::info!(
            order_id = %order.id(),
            execution_id = %execution.id(),
            side = %order.side(),
            lots = %lots,
            price = %price,
            commission = %commission,
            status = %new_status,
            settlement_date = %settlement_date,
            "Order executed"
        );

        let event = OrderExecutedEvent {
            order_id: order.id(),
            customer_id: order.customer_id(),
            customer_code,
            asset_id: order.asset_id(),
            bist_code: asset.bist_code,
            transaction_type: order.side(),
            new_status,
            executed_lots: lots,
            executed_price: price,
            commission_amount: commission,
            remaining_lots: order.remaining_lots(),
            event_timestamp: now,
        };

        Ok(ExecutionRecord { execution, event })
    }

    /// Execute both sides of a planned fill.
    ///
    /// The resting order must still be at the version the fill was planned
    /// against; otherwise the unit of work fails with a concurrency conflict.
    /// The error names the leg that failed so the caller knows whether to
    /// drop the candidate or stop matching the incoming order.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_match(
        &self,
        tx: &mut dyn Transaction,
        incoming: &mut Order,
        resting: &mut Order,
        fill: &Fill,
        rate: Decimal,
        today: NaiveDate,
        now: Timestamp,
    ) -> Result<[ExecutionRecord; 2], MatchLegError> {
        let incoming_record = self
            .execute_single_order(tx, incoming, fill.price, fill.lots, rate, today, now)
            .map_err(|source| MatchLegError {
                leg: MatchLeg::Incoming,
                source,
            })?;
        let resting_record = self
            .execute_single_order(tx, resting, fill.price, fill.lots, rate, today, now)
            .map_err(|source| MatchLegError {
                leg: MatchLeg::Resting,
                source,
            })?;
        Ok([incoming_record, resting_record])
    }
}
