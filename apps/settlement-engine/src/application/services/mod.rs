//! Application Services
//!
//! Stateless coordinators used by the use cases, plus the background tasks.

mod brokerage_firm_service;
mod commission_rate_provider;
mod day_end_cleanup;
mod holiday_refresher;
mod market_session;
mod order_execution_service;
mod portfolio_ledger;
mod queued_order_activator;
mod settlement_service;

pub use brokerage_firm_service::{BrokerageFirmService, NewFirm};
pub use commission_rate_provider::CommissionRateProvider;
pub use day_end_cleanup::{DayEndOrderCleanup, DayEndReport};
pub use holiday_refresher::HolidayCacheRefresher;
pub use market_session::{MarketSession, SessionHours, SessionPhase};
pub use order_execution_service::{
    ExecutionRecord, MatchLeg, MatchLegError, OrderExecutionService,
};
pub use portfolio_ledger::{OverrideReport, PortfolioLedger, Released, SettlementPolicy};
pub use queued_order_activator::QueuedOrderActivator;
pub use settlement_service::{SettlementService, SweepReport};

pub(crate) use portfolio_ledger::load_account;
