//! Order Matching Engine
//!
//! Pure price-time priority matching. Given an incoming order and a snapshot
//! of the opposite side of the book, produce the fills it would take, in
//! order. Persisting the fills is the caller's job, one pair at a time.

use crate::domain::order_execution::aggregate::Order;
use crate::domain::order_execution::value_objects::{OrderSide, OrderType};
use crate::domain::shared::{Lots, Money, OrderId};

/// One planned execution pair between the incoming and a resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// Resting order consumed.
    pub resting_order_id: OrderId,
    /// Version of the resting order in the snapshot the plan was built from.
    pub resting_version: u64,
    /// Lots executed on both sides.
    pub lots: Lots,
    /// Execution price for both sides.
    pub price: Money,
}

/// Price-time priority matcher.
pub struct OrderMatchingEngine;

impl OrderMatchingEngine {
    /// True if `resting` can trade against `incoming`.
    ///
    /// MARKET resting orders cross unconditionally.
    #[must_use]
    pub fn is_eligible(incoming: &Order, resting: &Order) -> bool {
        if resting.id() == incoming.id()
            || resting.asset_id() != incoming.asset_id()
            || resting.side() != incoming.side().opposite()
            || !resting.is_open()
            || resting.remaining_lots().is_zero()
        {
            return false;
        }
        if resting.order_type() == OrderType::Market {
            return true;
        }
        match incoming.side() {
            OrderSide::Buy => resting.locked_price() <= incoming.locked_price(),
            OrderSide::Sell => resting.locked_price() >= incoming.locked_price(),
        }
    }

    /// Price both sides trade at: the resting order's own price, or the
    /// incoming price when the resting order has none of its own.
    #[must_use]
    pub fn execution_price(incoming: &Order, resting: &Order) -> Money {
        resting.limit_price().unwrap_or_else(|| incoming.locked_price())
    }

    /// Eligible candidates, best price first, earliest first within a price.
    #[must_use]
    pub fn rank<'a>(incoming: &Order, book: &'a [Order]) -> Vec<&'a Order> {
        let mut candidates: Vec<&Order> = book
            .iter()
            .filter(|resting| Self::is_eligible(incoming, resting))
            .collect();

        candidates.sort_by(|a, b| {
            let pa = Self::execution_price(incoming, a);
            let pb = Self::execution_price(incoming, b);
            let by_price = match incoming.side() {
                OrderSide::Buy => pa.cmp(&pb),
                OrderSide::Sell => pb.cmp(&pa),
            };
            by_price
                .then_with(|| a.created_at().cmp(&b.created_at()))
                .then_with(|| a.id().cmp(&b.id()))
        });
        candidates
    }

    /// Plan the fills for `incoming` against `book`.
    ///
    /// Stops when the incoming order is exhausted or candidates run out.
    #[must_use]
    pub fn match_order(incoming: &Order, book: &[Order]) -> Vec<Fill> {
        let mut remaining = incoming.remaining_lots();
        let mut fills = Vec::new();
        if !incoming.is_open() {
            return fills;
        }

        for resting in Self::rank(incoming, book) {
            if remaining.is_zero() {
                break;
            }
            let lots = remaining.min(resting.remaining_lots());
            fills.push(Fill {
                resting_order_id: resting.id(),
                resting_version: resting.version(),
                lots,
                price: Self::execution_price(incoming, resting),
            });
            remaining = remaining.saturating_sub(lots);
        }
        fills
    }
}
