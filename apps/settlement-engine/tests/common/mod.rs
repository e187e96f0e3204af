//! Shared harness for the integration tests: an engine wired to in-memory
//! adapters, a fixed clock, and helpers to seed accounts and place orders.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use settlement_engine::application::dto::{
    BulkOrderRequestDto, BulkOrderResponseDto, CustomerOrderDto, OrderDto,
};
use settlement_engine::application::ports::{FixedClock, UnitOfWork};
use settlement_engine::application::services::{
    BrokerageFirmService, CommissionRateProvider, DayEndOrderCleanup, MarketSession, NewFirm,
    OrderExecutionService, PortfolioLedger, QueuedOrderActivator, SessionHours, SettlementPolicy,
    SettlementService,
};
use settlement_engine::application::use_cases::{AccountFundingUseCase, OrderService};
use settlement_engine::domain::calendar::BusinessDayCalculator;
use settlement_engine::domain::order_execution::{OrderSide, OrderType};
use settlement_engine::domain::portfolio::{Asset, Customer, CustomerAccount, CustomerAsset};
use settlement_engine::domain::shared::{AccountId, AssetId, CustomerId, FirmId, Lots, Money};
use settlement_engine::infrastructure::events::InMemoryEventPublisher;
use settlement_engine::infrastructure::market_data::InMemoryLivePrices;
use settlement_engine::infrastructure::persistence::{
    InMemoryBrokerageFirmRepository, InMemoryStore,
};

pub const RATE: Decimal = dec!(0.001);
pub const ASSET: AssetId = AssetId::new(1);
pub const CODE: &str = "GARAN";

pub type TestOrderService = OrderService<
    InMemoryStore,
    InMemoryEventPublisher,
    InMemoryLivePrices,
    InMemoryBrokerageFirmRepository,
    FixedClock,
>;

pub type TestActivator = QueuedOrderActivator<
    InMemoryStore,
    InMemoryEventPublisher,
    InMemoryLivePrices,
    InMemoryBrokerageFirmRepository,
    FixedClock,
>;

/// Friday 2024-03-08, 10:30 exchange time (UTC+3).
pub fn trading_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 8, 7, 30, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct TestEngine {
    pub store: Arc<InMemoryStore>,
    pub events: Arc<InMemoryEventPublisher>,
    pub prices: Arc<InMemoryLivePrices>,
    pub clock: Arc<FixedClock>,
    pub session: Arc<MarketSession>,
    pub ledger: Arc<PortfolioLedger>,
    pub orders: Arc<TestOrderService>,
    pub settlement: SettlementService<InMemoryStore, FixedClock>,
    pub funding: AccountFundingUseCase<InMemoryStore, FixedClock>,
    pub rates: Arc<CommissionRateProvider<InMemoryBrokerageFirmRepository>>,
    pub firms: BrokerageFirmService<InMemoryBrokerageFirmRepository>,
    pub firm_id: FirmId,
    pub cleanup: DayEndOrderCleanup<
        InMemoryStore,
        InMemoryEventPublisher,
        InMemoryLivePrices,
        InMemoryBrokerageFirmRepository,
        FixedClock,
    >,
}

impl TestEngine {
    /// Engine with settlement controls on.
    pub async fn new() -> Self {
        Self::with_policy(SettlementPolicy {
            controls_active: true,
        })
        .await
    }

    pub async fn with_policy(policy: SettlementPolicy) -> Self {
        let store = Arc::new(InMemoryStore::new());
        store.insert_asset(Asset {
            id: ASSET,
            bist_code: CODE.to_string(),
            isin_code: "TRAGARAN91N1".to_string(),
            company_name: "Garanti BBVA".to_string(),
            currency: "TRY".to_string(),
            settlement_days: 2,
            max_order_value: None,
        });

        let firms = Arc::new(InMemoryBrokerageFirmRepository::new());
        let rates = Arc::new(CommissionRateProvider::new(Arc::clone(&firms)));
        let firm_service = BrokerageFirmService::new(Arc::clone(&firms), Arc::clone(&rates));
        let firm_id = firm_service
            .create(NewFirm {
                name: "Test Brokerage".to_string(),
                commission_rate: RATE,
                active: true,
            })
            .await
            .unwrap()
            .id();

        let events = Arc::new(InMemoryEventPublisher::new());
        let prices = Arc::new(InMemoryLivePrices::new());
        let clock = Arc::new(FixedClock::new(trading_time()));
        let calendar = Arc::new(BusinessDayCalculator::new());
        let session = Arc::new(MarketSession::new(
            SessionHours {
                utc_offset: chrono::FixedOffset::east_opt(3 * 3600).unwrap(),
                open: chrono::NaiveTime::from_hms_opt(9, 55, 0).unwrap(),
                close: chrono::NaiveTime::from_hms_opt(18, 5, 0).unwrap(),
            },
            Arc::clone(&calendar),
            false,
        ));
        let ledger = Arc::new(PortfolioLedger::new(policy));

        let orders = Arc::new(OrderService::new(
            Arc::clone(&store),
            Arc::clone(&events),
            Arc::clone(&prices),
            Arc::clone(&rates),
            Arc::clone(&clock),
            Arc::clone(&ledger),
            OrderExecutionService::new(Arc::clone(&ledger), calendar),
            Arc::clone(&session),
            16,
        ));
        let settlement = SettlementService::new(
            Arc::clone(&store),
            Arc::clone(&ledger),
            Arc::clone(&session),
            Arc::clone(&clock),
        );
        let funding =
            AccountFundingUseCase::new(Arc::clone(&store), Arc::clone(&ledger), Arc::clone(&clock));
        let cleanup =
            DayEndOrderCleanup::new(Arc::clone(&orders), Arc::clone(&session), Arc::clone(&clock));

        Self {
            store,
            events,
            prices,
            clock,
            session,
            ledger,
            orders,
            settlement,
            funding,
            rates,
            firms: firm_service,
            firm_id,
            cleanup,
        }
    }

    /// Activator over this engine's order service.
    pub fn activator(&self) -> TestActivator {
        QueuedOrderActivator::new(Arc::clone(&self.orders), Duration::from_secs(30))
    }

    /// Customer `id` with account `id`, `cash` and optionally `lots` of the asset.
    pub fn customer(&self, id: u64, cash: Decimal, lots: u32) -> AccountId {
        self.store.insert_customer(Customer {
            id: CustomerId::new(id),
            customer_code: format!("C{id:04}"),
            name: format!("Customer {id}"),
        });
        self.store.insert_account(CustomerAccount::open(
            AccountId::new(id),
            CustomerId::new(id),
            format!("ACC-{id}"),
            Money::new(cash),
        ));
        if lots > 0 {
            self.store.insert_holding(CustomerAsset::with_lots(
                CustomerId::new(id),
                ASSET,
                Lots::new(lots),
                Money::new(dec!(8)),
            ));
        }
        AccountId::new(id)
    }

    /// Single-line LIMIT order.
    pub async fn limit(
        &self,
        account: AccountId,
        side: OrderSide,
        lots: u32,
        price: Decimal,
    ) -> OrderDto {
        let response = self
            .orders
            .create_bulk_order(request(side, OrderType::Limit, Some(price), &[(account, lots)]))
            .await
            .unwrap();
        response.orders.into_iter().next().unwrap()
    }

    pub fn account(&self, id: AccountId) -> CustomerAccount {
        self.store
            .transact(|tx| Ok(tx.find_account(id)?))
            .unwrap()
            .unwrap()
    }

    pub fn holding(&self, customer: u64) -> Option<CustomerAsset> {
        self.store
            .transact(|tx| Ok(tx.find_holding(CustomerId::new(customer), ASSET)?))
            .unwrap()
    }

    /// Checks every stored order, account and holding.
    pub fn assert_invariants(&self) {
        let state = self.store.snapshot();
        for account in state.accounts() {
            assert!(account.blocked_balance() >= Money::ZERO, "negative block on {}", account.id());
            assert!(
                account.blocked_balance() <= account.balance(),
                "blocked above balance on {}",
                account.id()
            );
        }
        for holding in state.holdings() {
            assert!(holding.blocked_lots() <= holding.total_lots());
        }
        for order in state.orders() {
            assert!(order.filled_lots() <= order.initial_lots());
            let executed: Lots = state
                .executions()
                .filter(|e| e.order_id() == order.id())
                .map(|e| e.lots())
                .sum();
            assert_eq!(executed, order.filled_lots(), "executions disagree with order {}", order.id());
        }
    }
}

pub fn request(
    side: OrderSide,
    order_type: OrderType,
    limit_price: Option<Decimal>,
    lines: &[(AccountId, u32)],
) -> BulkOrderRequestDto {
    BulkOrderRequestDto {
        bist_code: CODE.to_string(),
        side,
        order_type,
        limit_price,
        customer_orders: lines
            .iter()
            .map(|&(customer_account_id, lot_amount)| CustomerOrderDto {
                customer_account_id,
                lot_amount,
            })
            .collect(),
        created_by: Some("integration".to_string()),
    }
}

pub fn only(response: &BulkOrderResponseDto) -> &OrderDto {
    assert_eq!(response.orders.len(), 1);
    &response.orders[0]
}
