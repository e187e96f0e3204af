//! Settlement Service
//!
//! Settles executions whose settlement date has arrived. Each execution
//! settles in its own unit of work, so one failure leaves the rest of the
//! sweep unaffected and the failed execution is retried on the next sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::{MarketSession, OverrideReport, PortfolioLedger};
use crate::application::ports::{ClockPort, UnitOfWork};
use crate::domain::shared::Timestamp;
use crate::error::EngineError;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Executions settled.
    pub settled: usize,
    /// Executions found already settled.
    pub skipped: usize,
    /// Executions that failed and stay unsettled.
    pub failed: usize,
}

/// Periodic settlement of due executions.
pub struct SettlementService<U, C>
where
    U: UnitOfWork,
    C: ClockPort,
{
    uow: Arc<U>,
    ledger: Arc<PortfolioLedger>,
    session: Arc<MarketSession>,
    clock: Arc<C>,
}

impl<U, C> SettlementService<U, C>
where
    U: UnitOfWork,
    C: ClockPort,
{
    /// Create the service.
    pub const fn new(
        uow: Arc<U>,
        ledger: Arc<PortfolioLedger>,
        session: Arc<MarketSession>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            uow,
            ledger,
            session,
            clock,
        }
    }

    /// Settle every unsettled execution due on or before `today`.
    pub fn run_sweep(&self, today: NaiveDate) -> Result<SweepReport, EngineError> {
        let due = self.uow.transact(|tx| Ok(tx.find_unsettled_due(today)?))?;
        let mut report = SweepReport::default();

        for execution in due {
            let now = Timestamp::new(self.clock.now());
            let execution_id = execution.id();
            match self
                .uow
                .transact(|tx| self.ledger.settle_execution(tx, execution_id, now))
            {
                Ok(true) => report.settled += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    let failure = EngineError::Settlement {
                        execution_id,
                        message: e.to_string(),
                    };
                    error!(
                        execution_id = %execution_id,
                        code = e.code().reason(),
                        error = %failure,
                        "Settlement failed"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            date = %today,
            settled = report.settled,
            skipped = report.skipped,
            failed = report.failed,
            "Settlement sweep finished"
        );
        Ok(report)
    }

    /// Settle everything outstanding and drop every block, in one unit of work.
    pub fn release_all_blocks_for_override(&self) -> Result<OverrideReport, EngineError> {
        let now = Timestamp::new(self.clock.now());
        self.uow
            .transact(|tx| self.ledger.release_all_blocks_for_override(tx, now))
    }

    /// Sweep on business days every `every` until `shutdown` fires.
    pub async fn run(&self, every: Duration, shutdown: CancellationToken) {
        info!(interval_secs = every.as_secs(), "Starting settlement sweeper");

        let mut interval = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = self.clock.now();
                    if !self.session.is_business_day(now) {
                        debug!("Not a business day, skipping settlement sweep");
                        continue;
                    }
                    if let Err(e) = self.run_sweep(self.session.local_date(now)) {
                        error!(error = %e, "Settlement sweep aborted");
                    }
                }
                () = shutdown.cancelled() => {
                    info!("Settlement sweeper shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::FixedClock;
    use crate::application::services::SessionHours;
    use crate::domain::calendar::BusinessDayCalculator;
    use crate::domain::order_execution::{
        CreateOrderCommand, NewExecution, Order, OrderExecution, OrderSide, OrderType,
    };
    use crate::domain::portfolio::{Asset, CustomerAccount, CustomerAsset};
    use crate::domain::shared::{AccountId, AssetId, BatchId, CustomerId, ExecutionId, Lots, Money};
    use crate::infrastructure::persistence::InMemoryStore;
    use chrono::{FixedOffset, NaiveTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn make_service(store: Arc<InMemoryStore>) -> SettlementService<InMemoryStore, FixedClock> {
        let calendar = Arc::new(BusinessDayCalculator::new());
        let session = MarketSession::new(
            SessionHours {
                utc_offset: FixedOffset::east_opt(3 * 3600).unwrap(),
                open: NaiveTime::from_hms_opt(9, 55, 0).unwrap(),
                close: NaiveTime::from_hms_opt(18, 5, 0).unwrap(),
            },
            calendar,
            false,
        );
        SettlementService::new(
            store,
            Arc::new(PortfolioLedger::default()),
            Arc::new(session),
            Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 12, 7, 0, 0).unwrap())),
        )
    }

    /// A filled SELL of 100 lots at 10.00 with one unsettled execution due on the 12th.
    fn seed_sold_position(store: &InMemoryStore) -> ExecutionId {
        store.insert_asset(Asset {
            id: AssetId::new(1),
            bist_code: "ASELS".to_string(),
            isin_code: "TRAASELS91H2".to_string(),
            company_name: "Aselsan".to_string(),
            currency: "TRY".to_string(),
            settlement_days: 2,
            max_order_value: None,
        });
        store.insert_account(CustomerAccount::open(
            AccountId::new(1),
            CustomerId::new(1),
            "ACC-1",
            Money::ZERO,
        ));
        store.insert_holding(CustomerAsset::with_lots(
            CustomerId::new(1),
            AssetId::new(1),
            Lots::new(100),
            Money::new(dec!(9)),
        ));

        let now = Timestamp::now();
        store
            .transact(|tx| {
                let id = tx.next_order_id();
                let mut order = Order::new(
                    id,
                    CreateOrderCommand {
                        batch_id: BatchId::new("b"),
                        customer_account_id: AccountId::new(1),
                        customer_id: CustomerId::new(1),
                        asset_id: AssetId::new(1),
                        side: OrderSide::Sell,
                        order_type: OrderType::Limit,
                        lots: Lots::new(100),
                        price: Money::new(dec!(10)),
                        created_by: None,
                    },
                    now,
                )?;
                tx.insert_order(&order)?;
                PortfolioLedger::default().block_asset_for_sell_order(tx, &order)?;
                order.activate(now)?;
                order.apply_fill(Lots::new(100), now)?;
                tx.update_order(&mut order)?;
                let execution = OrderExecution::new(NewExecution {
                    id: tx.next_execution_id(),
                    order_id: order.id(),
                    lots: Lots::new(100),
                    price: Money::new(dec!(10)),
                    locked_price: Money::new(dec!(10)),
                    commission: Money::new(dec!(1)),
                    executed_at: now,
                    settlement_date: date(12),
                });
                tx.insert_execution(&execution)?;
                Ok(execution.id())
            })
            .unwrap()
    }

    #[test]
    fn nothing_settles_before_the_settlement_date() {
        let store = Arc::new(InMemoryStore::new());
        seed_sold_position(&store);
        let report = make_service(Arc::clone(&store)).run_sweep(date(11)).unwrap();
        assert_eq!(report, SweepReport::default());
    }

    #[test]
    fn due_sell_settles_once() {
        let store = Arc::new(InMemoryStore::new());
        let execution_id = seed_sold_position(&store);
        let service = make_service(Arc::clone(&store));

        let first = service.run_sweep(date(12)).unwrap();
        assert_eq!(first.settled, 1);

        let (account, holding, execution) = store
            .transact(|tx| {
                Ok((
                    tx.find_account(AccountId::new(1))?,
                    tx.find_holding(CustomerId::new(1), AssetId::new(1))?,
                    tx.find_execution(execution_id)?,
                ))
            })
            .unwrap();
        assert_eq!(account.unwrap().balance(), Money::new(dec!(999)));
        assert!(holding.is_none());
        assert!(execution.unwrap().is_settled());

        let second = service.run_sweep(date(12)).unwrap();
        assert_eq!(second, SweepReport::default());

        let settled_directly = store
            .transact(|tx| PortfolioLedger::default().settle_execution(tx, execution_id, Timestamp::now()))
            .unwrap();
        assert!(!settled_directly);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let service = make_service(Arc::new(InMemoryStore::new()));
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), service.run(Duration::from_secs(60), shutdown))
            .await
            .unwrap();
    }
}
