//! Append-only account ledger row.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::{AccountId, ExecutionId, Money, OrderId, Timestamp, TransactionId};

/// Why a ledger row was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Cash paid in.
    Deposit,
    /// Cash paid out.
    Withdrawal,
    /// Cash reserved for a buy order.
    OrderBlocked,
    /// Reserved cash released.
    OrderUnblocked,
    /// Buyer paid at settlement.
    TradeSettlementDebit,
    /// Seller paid at settlement.
    TradeSettlementCredit,
}

impl TransactionKind {
    /// +1 when the row adds to what the customer can spend, -1 otherwise.
    #[must_use]
    pub const fn direction(&self) -> i8 {
        match self {
            Self::Deposit | Self::OrderUnblocked | Self::TradeSettlementCredit => 1,
            Self::Withdrawal | Self::OrderBlocked | Self::TradeSettlementDebit => -1,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdrawal => "WITHDRAWAL",
            Self::OrderBlocked => "ORDER_BLOCKED",
            Self::OrderUnblocked => "ORDER_UNBLOCKED",
            Self::TradeSettlementDebit => "TRADE_SETTLEMENT_DEBIT",
            Self::TradeSettlementCredit => "TRADE_SETTLEMENT_CREDIT",
        };
        write!(f, "{s}")
    }
}

/// Fields of a row about to be appended.
#[derive(Debug, Clone)]
pub struct NewAccountTransaction {
    /// Row kind.
    pub kind: TransactionKind,
    /// Positive amount moved.
    pub amount: Money,
    /// Originating order.
    pub order_id: Option<OrderId>,
    /// Originating execution.
    pub execution_id: Option<ExecutionId>,
    /// Free text.
    pub description: String,
}

/// An immutable ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTransaction {
    /// Row identity.
    pub id: TransactionId,
    /// Account affected.
    pub account_id: AccountId,
    /// Row kind.
    pub kind: TransactionKind,
    /// +1 or -1.
    pub direction: i8,
    /// Positive amount moved.
    pub amount: Money,
    /// Account balance after the mutation.
    pub balance_after: Money,
    /// Originating order.
    pub order_id: Option<OrderId>,
    /// Originating execution.
    pub execution_id: Option<ExecutionId>,
    /// Free text.
    pub description: String,
    /// When the row was written.
    pub created_at: Timestamp,
}

impl AccountTransaction {
    /// Build a row from its fields.
    #[must_use]
    pub fn record(
        id: TransactionId,
        account_id: AccountId,
        balance_after: Money,
        new: NewAccountTransaction,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            account_id,
            kind: new.kind,
            direction: new.kind.direction(),
            amount: new.amount,
            balance_after,
            order_id: new.order_id,
            execution_id: new.execution_id,
            description: new.description,
            created_at: now,
        }
    }
}
