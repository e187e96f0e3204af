//! Order intake and matching against the in-memory book.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use common::{TestEngine, date, only, request};
use settlement_engine::application::ports::{ClockPort, UnitOfWork};
use settlement_engine::domain::order_execution::{
    CreateOrderCommand, Order, OrderEvent, OrderSide, OrderStatus, OrderType,
};
use settlement_engine::domain::shared::{BatchId, CustomerId, Lots, Money, Timestamp};
use settlement_engine::error::ErrorCode;

#[tokio::test]
async fn buy_sweeps_two_price_levels_in_price_order() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(10000), 0);
    let cheap_seller = engine.customer(2, dec!(0), 100);
    let dear_seller = engine.customer(3, dec!(0), 40);

    // The dearer level is entered first; price still wins over time.
    let dear = engine.limit(dear_seller, OrderSide::Sell, 40, dec!(10.00)).await;
    let cheap = engine.limit(cheap_seller, OrderSide::Sell, 60, dec!(9.50)).await;
    let buy = engine.limit(buyer, OrderSide::Buy, 100, dec!(10.00)).await;

    assert_eq!(buy.status, OrderStatus::Filled);
    assert_eq!(buy.filled_lots, 100);
    assert_eq!(engine.orders.get_order(cheap.order_id).unwrap().status, OrderStatus::Filled);
    assert_eq!(engine.orders.get_order(dear.order_id).unwrap().status, OrderStatus::Filled);

    let executions = engine
        .store
        .transact(|tx| Ok(tx.find_executions_by_order(buy.order_id)?))
        .unwrap();
    assert_eq!(executions.len(), 2);
    assert_eq!(executions[0].lots(), Lots::new(60));
    assert_eq!(executions[0].price(), Money::new(dec!(9.50)));
    assert_eq!(executions[0].commission(), Money::new(dec!(0.57)));
    assert_eq!(executions[1].lots(), Lots::new(40));
    assert_eq!(executions[1].price(), Money::new(dec!(10.00)));
    assert_eq!(executions[1].commission(), Money::new(dec!(0.40)));
    assert!(executions.iter().all(|e| e.settlement_date() == date(2024, 3, 12)));

    // Cash stays reserved until settlement.
    let account = engine.account(buyer);
    assert_eq!(account.balance(), Money::new(dec!(10000)));
    assert_eq!(account.blocked_balance(), Money::new(dec!(1001)));

    let holding = engine.holding(1).unwrap();
    assert_eq!(holding.total_lots(), Lots::new(100));
    assert_eq!(holding.blocked_lots(), Lots::new(100));
    assert_eq!(holding.average_cost(), Money::new(dec!(9.7)));

    let executed = engine
        .events
        .events()
        .into_iter()
        .filter(|e| matches!(e, OrderEvent::Executed(_)))
        .count();
    assert_eq!(executed, 4);
    engine.assert_invariants();
}

#[tokio::test]
async fn equal_prices_fill_the_earlier_order_first() {
    let engine = TestEngine::new().await;
    let a = engine.customer(1, dec!(0), 10);
    let b = engine.customer(2, dec!(0), 10);
    let buyer = engine.customer(3, dec!(1000), 0);

    let first = engine.limit(a, OrderSide::Sell, 5, dec!(10.00)).await;
    engine
        .clock
        .set(Utc.with_ymd_and_hms(2024, 3, 8, 7, 31, 0).unwrap());
    let second = engine.limit(b, OrderSide::Sell, 5, dec!(10.00)).await;
    engine.limit(buyer, OrderSide::Buy, 1, dec!(10.00)).await;

    let first = engine.orders.get_order(first.order_id).unwrap();
    let second = engine.orders.get_order(second.order_id).unwrap();
    assert_eq!(first.status, OrderStatus::PartiallyFilled);
    assert_eq!(first.filled_lots, 1);
    assert_eq!(second.status, OrderStatus::Active);
    assert_eq!(second.filled_lots, 0);
}

#[tokio::test]
async fn incoming_sell_executes_at_resting_buy_price() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(1000), 0);
    let seller = engine.customer(2, dec!(0), 10);

    let buy = engine.limit(buyer, OrderSide::Buy, 10, dec!(10.00)).await;
    let sell = engine.limit(seller, OrderSide::Sell, 10, dec!(9.80)).await;

    assert_eq!(sell.status, OrderStatus::Filled);
    let executions = engine
        .store
        .transact(|tx| Ok(tx.find_executions_by_order(buy.order_id)?))
        .unwrap();
    assert_eq!(executions[0].price(), Money::new(dec!(10.00)));
}

#[tokio::test]
async fn non_crossing_orders_rest_in_the_book() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(1000), 0);
    let seller = engine.customer(2, dec!(0), 10);

    let sell = engine.limit(seller, OrderSide::Sell, 10, dec!(10.50)).await;
    let buy = engine.limit(buyer, OrderSide::Buy, 10, dec!(10.00)).await;

    assert_eq!(sell.status, OrderStatus::Active);
    assert_eq!(buy.status, OrderStatus::Active);
    assert_eq!(engine.holding(2).unwrap().blocked_lots(), Lots::new(10));
    engine.assert_invariants();
}

#[tokio::test]
async fn insufficient_balance_rejects_without_reserving() {
    let engine = TestEngine::new().await;
    let poor = engine.customer(1, dec!(500), 0);
    let rich = engine.customer(2, dec!(5000), 0);

    let response = engine
        .orders
        .create_bulk_order(request(
            OrderSide::Buy,
            OrderType::Limit,
            Some(dec!(10.00)),
            &[(poor, 100), (rich, 100)],
        ))
        .await
        .unwrap();

    assert_eq!(response.orders.len(), 2);
    assert_eq!(response.rejected().count(), 1);
    assert_eq!(response.accepted().count(), 1);
    let rejected = response.rejected().next().unwrap();
    assert_eq!(rejected.customer_account_id, poor);
    assert!(rejected.status_reason.is_some());

    let account = engine.account(poor);
    assert_eq!(account.balance(), Money::new(dec!(500)));
    assert_eq!(account.blocked_balance(), Money::ZERO);
    assert!(engine.store.snapshot().ledger().iter().all(|row| row.account_id != poor));
    assert_eq!(engine.account(rich).blocked_balance(), Money::new(dec!(1001)));
}

#[tokio::test]
async fn selling_more_than_held_is_rejected() {
    let engine = TestEngine::new().await;
    let seller = engine.customer(1, dec!(0), 10);

    let sell = engine.limit(seller, OrderSide::Sell, 11, dec!(10.00)).await;

    assert_eq!(sell.status, OrderStatus::Rejected);
    assert_eq!(engine.holding(1).unwrap().blocked_lots(), Lots::ZERO);
}

#[tokio::test]
async fn off_tick_price_is_a_validation_error() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(1000), 0);

    let err = engine
        .orders
        .create_bulk_order(request(OrderSide::Buy, OrderType::Limit, Some(dec!(19.995)), &[(buyer, 1)]))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidTickSize);
    assert!(engine.store.snapshot().orders().next().is_none());
}

#[tokio::test]
async fn empty_or_zero_lot_requests_are_refused() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(1000), 0);

    let empty = engine
        .orders
        .create_bulk_order(request(OrderSide::Buy, OrderType::Limit, Some(dec!(10)), &[]))
        .await
        .unwrap_err();
    assert_eq!(empty.code(), ErrorCode::InvalidRequest);

    let zero = engine
        .orders
        .create_bulk_order(request(OrderSide::Buy, OrderType::Limit, Some(dec!(10)), &[(buyer, 0)]))
        .await
        .unwrap_err();
    assert_eq!(zero.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn unknown_asset_is_not_found() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(1000), 0);
    let mut req = request(OrderSide::Buy, OrderType::Limit, Some(dec!(10)), &[(buyer, 1)]);
    req.bist_code = "NOPE".to_string();

    let err = engine.orders.create_bulk_order(req).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn market_buy_locks_live_price_and_fills_at_resting_price() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(1000), 0);
    let seller = engine.customer(2, dec!(0), 10);
    engine.limit(seller, OrderSide::Sell, 10, dec!(9.80)).await;
    engine.prices.set_price("garan", Money::new(dec!(10.00)));

    let response = engine
        .orders
        .create_bulk_order(request(OrderSide::Buy, OrderType::Market, None, &[(buyer, 10)]))
        .await
        .unwrap();
    let buy = only(&response);

    assert_eq!(buy.status, OrderStatus::Filled);
    assert_eq!(buy.locked_price, dec!(10.00));
    let executions = engine
        .store
        .transact(|tx| Ok(tx.find_executions_by_order(buy.order_id)?))
        .unwrap();
    assert_eq!(executions[0].price(), Money::new(dec!(9.80)));
    assert_eq!(executions[0].locked_price(), Money::new(dec!(10.00)));
    engine.assert_invariants();
}

#[tokio::test]
async fn market_order_without_live_price_is_refused() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(1000), 0);

    let err = engine
        .orders
        .create_bulk_order(request(OrderSide::Buy, OrderType::Market, None, &[(buyer, 10)]))
        .await
        .unwrap_err();

    assert!(matches!(err, settlement_engine::EngineError::Validation { .. }));
}

#[tokio::test]
async fn weekend_orders_are_refused_even_with_override() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(1000), 0);
    // Saturday
    engine
        .clock
        .set(Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0).unwrap());
    engine.session.set_trading_override(true);

    let err = engine
        .orders
        .create_bulk_order(request(OrderSide::Buy, OrderType::Limit, Some(dec!(10)), &[(buyer, 1)]))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::MarketClosed);
}

#[tokio::test]
async fn override_opens_the_evening_session() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(1000), 0);
    // Friday 21:00 local
    engine
        .clock
        .set(Utc.with_ymd_and_hms(2024, 3, 8, 18, 0, 0).unwrap());

    let queued = engine
        .orders
        .create_bulk_order(request(OrderSide::Buy, OrderType::Limit, Some(dec!(10)), &[(buyer, 1)]))
        .await
        .unwrap();
    assert_eq!(only(&queued).status, OrderStatus::Queued);
    assert_eq!(engine.account(buyer).blocked_balance(), Money::new(dec!(10.01)));

    engine.session.set_trading_override(true);
    let response = engine
        .orders
        .create_bulk_order(request(OrderSide::Buy, OrderType::Limit, Some(dec!(10)), &[(buyer, 1)]))
        .await
        .unwrap();
    assert_eq!(only(&response).status, OrderStatus::Active);
}

#[tokio::test]
async fn rematch_fills_crossing_orders_entered_without_matching() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(1000), 0);
    let seller = engine.customer(2, dec!(0), 10);

    // Stage a crossed book directly, as if a price move made it cross.
    let now = Timestamp::new(engine.clock.now());
    let (buy_id, sell_id) = engine
        .store
        .transact(|tx| {
            let mut ids = Vec::new();
            for (account, side, price) in [
                (buyer, OrderSide::Buy, dec!(10.00)),
                (seller, OrderSide::Sell, dec!(9.90)),
            ] {
                let id = tx.next_order_id();
                let mut order = Order::new(
                    id,
                    CreateOrderCommand {
                        batch_id: BatchId::new("staged"),
                        customer_account_id: account,
                        customer_id: CustomerId::new(account.value()),
                        asset_id: common::ASSET,
                        side,
                        order_type: OrderType::Limit,
                        lots: Lots::new(10),
                        price: Money::new(price),
                        created_by: None,
                    },
                    now,
                )?;
                tx.insert_order(&order)?;
                engine.ledger.reserve_for_order(tx, &order, common::RATE, now)?;
                order.activate(now)?;
                tx.update_order(&mut order)?;
                ids.push(order.id());
            }
            Ok((ids[0], ids[1]))
        })
        .unwrap();

    let fills = engine
        .orders
        .try_to_match_orders_immediately(&[buy_id])
        .await
        .unwrap();

    assert_eq!(fills, 1);
    assert_eq!(engine.orders.get_order(buy_id).unwrap().status, OrderStatus::Filled);
    assert_eq!(engine.orders.get_order(sell_id).unwrap().status, OrderStatus::Filled);
    engine.assert_invariants();
}

#[tokio::test]
async fn split_fills_stay_within_the_reservation() {
    let engine = TestEngine::new().await;
    // 3 lots at 1.05 reserve 3.15 plus 0.0032 commission; nothing spare.
    let buyer = engine.customer(1, dec!(3.1532), 0);
    let mut sells = Vec::new();
    for id in 2..=4 {
        let seller = engine.customer(id, dec!(0), 1);
        sells.push(engine.limit(seller, OrderSide::Sell, 1, dec!(1.05)).await);
    }

    let buy = engine.limit(buyer, OrderSide::Buy, 3, dec!(1.05)).await;

    assert_eq!(buy.status, OrderStatus::Filled);
    for sell in &sells {
        assert_eq!(engine.orders.get_order(sell.order_id).unwrap().status, OrderStatus::Filled);
    }
    let commissions: Money = engine
        .store
        .transact(|tx| Ok(tx.find_executions_by_order(buy.order_id)?))
        .unwrap()
        .iter()
        .map(|e| e.commission())
        .sum();
    assert_eq!(commissions, Money::new(dec!(0.0032)));
    assert_eq!(engine.account(buyer).blocked_balance(), Money::new(dec!(3.1532)));
    engine.assert_invariants();
}

#[tokio::test]
async fn order_value_beyond_decimal_range_is_a_validation_error() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(1000), 0);

    let err = engine
        .orders
        .create_bulk_order(request(
            OrderSide::Buy,
            OrderType::Limit,
            Some(dec!(20000000000000000000000000000)),
            &[(buyer, 10)],
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(engine.store.snapshot().orders().next().is_none());
    assert!(engine.store.snapshot().ledger().is_empty());
}
