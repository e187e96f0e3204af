// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Settlement Engine - Order Execution & Settlement Core
//!
//! Brokerage back-office core: lot orders in, matched fills, ledger
//! movements, and T+N settlement over a business-day calendar.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic
//!   - `order_execution`: Order aggregate, status lifecycle, tick table, matching
//!   - `portfolio`: Accounts, holdings, ledger rows, reference data
//!   - `calendar`: Business-day arithmetic over a cached holiday set
//!   - `brokerage`: Brokerage firms and the active commission rate
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: Unit of work, event publisher, live prices, clock
//!   - `services`: `PortfolioLedger`, `OrderExecutionService`, settlement and background tasks
//!   - `use_cases`: `OrderService`, `AccountFundingUseCase`
//!   - `dto`: Request and response types for the calling layer
//!
//! - **Infrastructure**: Adapters
//!   - `persistence`: In-memory store with snapshot-and-swap units of work
//!   - `events`: Tracing and in-memory event publishers
//!   - `market_data`: In-memory live prices

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Engine error taxonomy.
pub mod error;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use application::services::{
    MarketSession, OrderExecutionService, PortfolioLedger, SettlementPolicy, SettlementService,
};
pub use application::use_cases::{AccountFundingUseCase, OrderService};
pub use domain::calendar::BusinessDayCalculator;
pub use domain::order_execution::{
    Order, OrderExecution, OrderMatchingEngine, OrderSide, OrderStatus, OrderType,
};
pub use error::{EngineError, ErrorCode};
