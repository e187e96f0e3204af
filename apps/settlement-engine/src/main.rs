//! Settlement Engine Binary
//!
//! Starts the order execution and settlement core with its background
//! tasks: settlement sweep, holiday refresh, queued order activation and
//! end-of-day cleanup.
//!
//! Storage is the in-memory adapter seeded with demo data, so state is lost
//! on exit. Each unit of work holds the store lock while it runs.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin settlement-engine
//! ```
//!
//! # Environment Variables
//!
//! - `SETTLEMENT_CONFIG`: Config file path (default: config.yaml)
//! - `RUST_LOG`: Log filter, overrides `logging.level` and `logging.directives`

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rust_decimal_macros::dec;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use settlement_engine::application::ports::SystemClock;
use settlement_engine::application::services::{
    BrokerageFirmService, CommissionRateProvider, DayEndOrderCleanup, HolidayCacheRefresher,
    MarketSession, NewFirm, OrderExecutionService, PortfolioLedger, QueuedOrderActivator,
    SettlementPolicy, SettlementService,
};
use settlement_engine::application::use_cases::OrderService;
use settlement_engine::config::{Config, load_config};
use settlement_engine::domain::calendar::BusinessDayCalculator;
use settlement_engine::domain::portfolio::{Asset, Customer, CustomerAccount};
use settlement_engine::domain::shared::{AccountId, AssetId, CustomerId, Money};
use settlement_engine::infrastructure::events::TracingEventPublisher;
use settlement_engine::infrastructure::market_data::InMemoryLivePrices;
use settlement_engine::infrastructure::persistence::{
    InMemoryBrokerageFirmRepository, InMemoryHolidayRepository, InMemoryStore,
};
use settlement_engine::telemetry::init_tracing;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

type ConcreteOrderService = OrderService<
    InMemoryStore,
    TracingEventPublisher,
    InMemoryLivePrices,
    InMemoryBrokerageFirmRepository,
    SystemClock,
>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let path = std::env::var("SETTLEMENT_CONFIG").ok();
    let config = load_config(path.as_deref()).context("loading configuration")?;
    init_tracing(&config.logging)
        .map_err(|e| anyhow::anyhow!("initializing tracing: {e}"))?;

    tracing::info!(
        controls_active = config.settlement.controls_active,
        trading_override = config.trading.trading_override,
        "Starting Settlement Engine"
    );

    let store = Arc::new(InMemoryStore::new());
    let firms = Arc::new(InMemoryBrokerageFirmRepository::new());
    let holidays = Arc::new(InMemoryHolidayRepository::new());
    let clock = Arc::new(SystemClock);

    let rates = Arc::new(CommissionRateProvider::new(Arc::clone(&firms)));
    let firm_service = BrokerageFirmService::new(Arc::clone(&firms), Arc::clone(&rates));
    seed_reference_data(&store, &firm_service, &config).await?;

    let calendar = Arc::new(BusinessDayCalculator::new());
    let refresher = HolidayCacheRefresher::new(
        Arc::clone(&calendar),
        holidays,
        Duration::from_secs(config.calendar.holiday_refresh_interval_secs),
    );
    refresher.refresh_once().await;

    let session = Arc::new(MarketSession::new(
        config.trading.session_hours()?,
        Arc::clone(&calendar),
        config.trading.trading_override,
    ));
    let ledger = Arc::new(PortfolioLedger::new(SettlementPolicy {
        controls_active: config.settlement.controls_active,
    }));

    let orders: Arc<ConcreteOrderService> = Arc::new(OrderService::new(
        Arc::clone(&store),
        Arc::new(TracingEventPublisher),
        Arc::new(InMemoryLivePrices::new()),
        rates,
        Arc::clone(&clock),
        Arc::clone(&ledger),
        OrderExecutionService::new(Arc::clone(&ledger), calendar),
        Arc::clone(&session),
        config.trading.max_match_rounds,
    ));
    let settlement = SettlementService::new(
        Arc::clone(&store),
        ledger,
        Arc::clone(&session),
        Arc::clone(&clock),
    );
    let activator = QueuedOrderActivator::new(
        Arc::clone(&orders),
        Duration::from_secs(config.activation.check_interval_secs),
    );
    let cleanup = DayEndOrderCleanup::new(orders, session, clock);

    let shutdown = CancellationToken::new();
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    let sweep_every = Duration::from_secs(config.settlement.sweep_interval_secs);
    let token = shutdown.clone();
    tasks.push(tokio::spawn(async move {
        settlement.run(sweep_every, token).await;
    }));

    let token = shutdown.clone();
    tasks.push(tokio::spawn(async move {
        refresher.run(token).await;
    }));

    let token = shutdown.clone();
    tasks.push(tokio::spawn(async move {
        activator.run(token).await;
    }));

    if config.cleanup.enabled {
        let check_every = Duration::from_secs(config.cleanup.check_interval_secs);
        let token = shutdown.clone();
        tasks.push(tokio::spawn(async move {
            cleanup.run(check_every, token).await;
        }));
    } else {
        tracing::info!("End-of-day cleanup disabled");
    }

    tracing::info!(tasks = tasks.len(), "Settlement engine ready");

    shutdown_signal().await;
    shutdown.cancel();

    let drain = join_tasks(tasks);
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, drain).await.is_err() {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Background tasks did not stop in time"
        );
    }

    tracing::info!("Settlement engine stopped");
    Ok(())
}

/// Wait for every task, logging any that panicked.
async fn join_tasks(tasks: Vec<JoinHandle<()>>) {
    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Background task ended abnormally");
        }
    }
}

/// Demo reference data for the in-memory store.
async fn seed_reference_data(
    store: &InMemoryStore,
    firms: &BrokerageFirmService<InMemoryBrokerageFirmRepository>,
    config: &Config,
) -> anyhow::Result<()> {
    firms
        .create(NewFirm {
            name: "Finchange Yatirim".to_string(),
            commission_rate: dec!(0.002),
            active: true,
        })
        .await
        .context("seeding brokerage firm")?;

    let settlement_days = config.trading.default_settlement_days;
    for (id, code, isin, name) in [
        (1, "THYAO", "TRATHYAO91M5", "Turk Hava Yollari"),
        (2, "GARAN", "TRAGARAN91N1", "Garanti BBVA"),
        (3, "ASELS", "TRAASELS91H2", "Aselsan"),
    ] {
        store.insert_asset(Asset {
            id: AssetId::new(id),
            bist_code: code.to_string(),
            isin_code: isin.to_string(),
            company_name: name.to_string(),
            currency: "TRY".to_string(),
            settlement_days,
            max_order_value: None,
        });
    }

    for (id, code, name) in [(1, "C0001", "Demo Customer One"), (2, "C0002", "Demo Customer Two")] {
        store.insert_customer(Customer {
            id: CustomerId::new(id),
            customer_code: code.to_string(),
            name: name.to_string(),
        });
        store.insert_account(CustomerAccount::open(
            AccountId::new(id),
            CustomerId::new(id),
            format!("ACC-{code}"),
            Money::new(dec!(100000)),
        ));
    }

    tracing::info!("Seeded demo reference data");
    Ok(())
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C"),
        () = terminate => tracing::info!("Received SIGTERM"),
    }
}
