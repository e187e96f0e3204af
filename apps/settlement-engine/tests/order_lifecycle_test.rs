//! Cancel, amend, list and end-of-day cleanup.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use common::{TestEngine, date, trading_time};
use settlement_engine::application::dto::{UpdateOrderRequestDto, ValidateLotRequestDto};
use settlement_engine::domain::order_execution::{
    OrderEvent, OrderFilter, OrderSide, OrderStatus, OrderType, PageRequest,
};
use settlement_engine::domain::shared::{AccountId, CustomerId, Lots, Money};
use settlement_engine::error::ErrorCode;

#[tokio::test]
async fn cancel_releases_the_whole_reservation() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(10000), 0);
    let buy = engine.limit(buyer, OrderSide::Buy, 100, dec!(10.00)).await;
    assert_eq!(engine.account(buyer).blocked_balance(), Money::new(dec!(1001)));

    let cancelled = engine.orders.cancel_order(buy.order_id).await.unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    let account = engine.account(buyer);
    assert_eq!(account.balance(), Money::new(dec!(10000)));
    assert_eq!(account.blocked_balance(), Money::ZERO);

    let events = engine.events.events();
    let Some(OrderEvent::Cancelled(event)) = events.last() else {
        panic!("expected a cancellation event, got {events:?}");
    };
    assert_eq!(event.cancelled_lots, Lots::new(100));
    assert_eq!(event.bist_code, common::CODE);

    let again = engine.orders.cancel_order(buy.order_id).await.unwrap_err();
    assert_eq!(again.code(), ErrorCode::InvalidOrderState);
    engine.assert_invariants();
}

#[tokio::test]
async fn cancel_of_sell_unblocks_lots() {
    let engine = TestEngine::new().await;
    let seller = engine.customer(1, dec!(0), 50);
    let sell = engine.limit(seller, OrderSide::Sell, 30, dec!(12.00)).await;
    assert_eq!(engine.holding(1).unwrap().blocked_lots(), Lots::new(30));

    engine.orders.cancel_order(sell.order_id).await.unwrap();

    let holding = engine.holding(1).unwrap();
    assert_eq!(holding.blocked_lots(), Lots::ZERO);
    assert_eq!(holding.total_lots(), Lots::new(50));
}

#[tokio::test]
async fn partial_fill_cancel_keeps_cost_of_the_filled_part_blocked() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(10000), 0);
    let seller = engine.customer(2, dec!(0), 30);
    engine.limit(seller, OrderSide::Sell, 30, dec!(10.00)).await;

    let buy = engine.limit(buyer, OrderSide::Buy, 100, dec!(10.00)).await;
    assert_eq!(buy.status, OrderStatus::PartiallyFilled);
    assert_eq!(buy.remaining_lots, 70);

    engine.orders.cancel_order(buy.order_id).await.unwrap();
    // 30 lots at 10.00 plus 0.30 commission await settlement.
    assert_eq!(engine.account(buyer).blocked_balance(), Money::new(dec!(300.3)));

    let report = engine.settlement.run_sweep(date(2024, 3, 12)).unwrap();
    assert_eq!(report.settled, 2);
    let account = engine.account(buyer);
    assert_eq!(account.balance(), Money::new(dec!(9699.7)));
    assert_eq!(account.blocked_balance(), Money::ZERO);
    engine.assert_invariants();
}

#[tokio::test]
async fn unknown_order_cannot_be_cancelled() {
    let engine = TestEngine::new().await;
    let err = engine
        .orders
        .cancel_order(settlement_engine::domain::shared::OrderId::new(404))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn update_with_stale_version_conflicts() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(10000), 0);
    let buy = engine.limit(buyer, OrderSide::Buy, 100, dec!(10.00)).await;

    let err = engine
        .orders
        .update_order(
            buy.order_id,
            UpdateOrderRequestDto {
                expected_version: buy.version - 1,
                order_type: OrderType::Limit,
                limit_price: Some(dec!(9.00)),
                lot_amount: 50,
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::ConcurrencyConflict);
    assert!(err.is_retryable());
    let unchanged = engine.orders.get_order(buy.order_id).unwrap();
    assert_eq!(unchanged.version, buy.version);
    assert_eq!(engine.account(buyer).blocked_balance(), Money::new(dec!(1001)));
}

#[tokio::test]
async fn update_re_reserves_for_the_new_terms() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(10000), 0);
    let buy = engine.limit(buyer, OrderSide::Buy, 100, dec!(10.00)).await;

    let updated = engine
        .orders
        .update_order(
            buy.order_id,
            UpdateOrderRequestDto {
                expected_version: buy.version,
                order_type: OrderType::Limit,
                limit_price: Some(dec!(9.00)),
                lot_amount: 50,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.initial_lots, 50);
    assert_eq!(updated.limit_price, Some(dec!(9.00)));
    assert!(updated.version > buy.version);
    // 50 × 9.00 + 0.45 commission
    assert_eq!(engine.account(buyer).blocked_balance(), Money::new(dec!(450.45)));
    engine.assert_invariants();
}

#[tokio::test]
async fn repricing_a_resting_order_into_the_book_matches_it() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(1000), 0);
    let seller = engine.customer(2, dec!(0), 10);
    let buy = engine.limit(buyer, OrderSide::Buy, 10, dec!(10.00)).await;
    let sell = engine.limit(seller, OrderSide::Sell, 10, dec!(10.50)).await;
    assert_eq!(sell.status, OrderStatus::Active);

    let updated = engine
        .orders
        .update_order(
            sell.order_id,
            UpdateOrderRequestDto {
                expected_version: sell.version,
                order_type: OrderType::Limit,
                limit_price: Some(dec!(10.00)),
                lot_amount: 10,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, OrderStatus::Filled);
    assert_eq!(engine.orders.get_order(buy.order_id).unwrap().status, OrderStatus::Filled);
    engine.assert_invariants();
}

#[tokio::test]
async fn update_cannot_shrink_below_filled() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(10000), 0);
    let seller = engine.customer(2, dec!(0), 30);
    engine.limit(seller, OrderSide::Sell, 30, dec!(10.00)).await;
    let buy = engine.limit(buyer, OrderSide::Buy, 100, dec!(10.00)).await;

    let err = engine
        .orders
        .update_order(
            buy.order_id,
            UpdateOrderRequestDto {
                expected_version: buy.version,
                order_type: OrderType::Limit,
                limit_price: Some(dec!(10.00)),
                lot_amount: 30,
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        engine.orders.get_order(buy.order_id).unwrap().status,
        OrderStatus::PartiallyFilled
    );
    engine.assert_invariants();
}

#[tokio::test]
async fn list_orders_filters_and_pages_newest_first() {
    let engine = TestEngine::new().await;
    let a = engine.customer(1, dec!(10000), 0);
    let b = engine.customer(2, dec!(10000), 0);
    for minute in 0..3 {
        engine
            .clock
            .set(Utc.with_ymd_and_hms(2024, 3, 8, 7, 30 + minute, 0).unwrap());
        engine.limit(a, OrderSide::Buy, 1, dec!(5.00)).await;
    }
    engine.limit(b, OrderSide::Buy, 1, dec!(5.00)).await;

    let filter = OrderFilter {
        customer_id: Some(CustomerId::new(1)),
        ..OrderFilter::default()
    };
    let page = engine
        .orders
        .list_orders(&filter, PageRequest { page: 0, size: 2 })
        .unwrap();

    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.content.len(), 2);
    assert!(page.content[0].created_at >= page.content[1].created_at);
    assert!(page.content.iter().all(|o| o.customer_account_id == a));

    let last = engine
        .orders
        .list_orders(&filter, PageRequest { page: 1, size: 2 })
        .unwrap();
    assert_eq!(last.content.len(), 1);

    let by_status = OrderFilter {
        status: Some(OrderStatus::Filled),
        ..OrderFilter::default()
    };
    assert_eq!(
        engine
            .orders
            .list_orders(&by_status, PageRequest { page: 0, size: 10 })
            .unwrap()
            .total_elements,
        0
    );
}

#[tokio::test]
async fn validate_lot_reports_without_mutating() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(100), 0);
    let seller = engine.customer(2, dec!(0), 5);
    let check = |account: AccountId, side, lots, price| ValidateLotRequestDto {
        customer_account_id: account,
        bist_code: common::CODE.to_string(),
        side,
        order_type: OrderType::Limit,
        limit_price: Some(price),
        lot_amount: lots,
    };

    let ok = engine
        .orders
        .validate_lot(check(buyer, OrderSide::Buy, 9, dec!(10.00)))
        .await
        .unwrap();
    assert!(ok.valid, "{:?}", ok.message);

    let too_dear = engine
        .orders
        .validate_lot(check(buyer, OrderSide::Buy, 10, dec!(10.00)))
        .await
        .unwrap();
    assert!(!too_dear.valid);

    let off_tick = engine
        .orders
        .validate_lot(check(buyer, OrderSide::Buy, 1, dec!(19.995)))
        .await
        .unwrap();
    assert!(!off_tick.valid);

    let too_many = engine
        .orders
        .validate_lot(check(seller, OrderSide::Sell, 6, dec!(10.00)))
        .await
        .unwrap();
    assert!(!too_many.valid);

    let unknown = engine
        .orders
        .validate_lot(check(AccountId::new(99), OrderSide::Buy, 1, dec!(10.00)))
        .await
        .unwrap();
    assert!(!unknown.valid);

    assert!(engine.store.snapshot().orders().next().is_none());
    assert_eq!(engine.account(buyer).blocked_balance(), Money::ZERO);
}

#[tokio::test]
async fn day_end_cleanup_cancels_open_orders_once() {
    let engine = TestEngine::new().await;
    let buyer = engine.customer(1, dec!(10000), 0);
    let seller = engine.customer(2, dec!(0), 20);
    let buy = engine.limit(buyer, OrderSide::Buy, 10, dec!(9.00)).await;
    let sell = engine.limit(seller, OrderSide::Sell, 20, dec!(11.00)).await;

    assert!(engine.cleanup.run_if_due(trading_time()).await.is_none());

    // Friday 18:30 local
    let evening = Utc.with_ymd_and_hms(2024, 3, 8, 15, 30, 0).unwrap();
    engine.clock.set(evening);
    let report = engine.cleanup.run_if_due(evening).await.unwrap();
    assert_eq!(report.cancelled, 2);
    assert_eq!(report.failed, 0);

    assert_eq!(engine.orders.get_order(buy.order_id).unwrap().status, OrderStatus::Cancelled);
    assert_eq!(engine.orders.get_order(sell.order_id).unwrap().status, OrderStatus::Cancelled);
    assert_eq!(engine.account(buyer).blocked_balance(), Money::ZERO);
    assert_eq!(engine.holding(2).unwrap().blocked_lots(), Lots::ZERO);

    assert!(engine.cleanup.run_if_due(evening).await.is_none());
}

#[tokio::test]
async fn day_end_cleanup_skips_weekends() {
    let engine = TestEngine::new().await;
    let saturday_evening = Utc.with_ymd_and_hms(2024, 3, 9, 16, 0, 0).unwrap();
    assert!(engine.cleanup.run_if_due(saturday_evening).await.is_none());
}

#[test]
fn cancel_can_be_driven_from_sync_code() {
    tokio_test::block_on(async {
        let engine = TestEngine::new().await;
        let seller = engine.customer(1, dec!(0), 5);
        let sell = engine.limit(seller, OrderSide::Sell, 5, dec!(7.00)).await;
        let cancelled = tokio_test::assert_ok!(engine.orders.cancel_order(sell.order_id).await);
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    });
}
