//! Order Service
//!
//! Entry point for order intake and lifecycle:
//!
//! 1. Validate the request (trading day, tick, order value, live price).
//! 2. Per customer line, reserve and activate in one unit of work; a
//!    reservation failure records the order as REJECTED instead. Outside
//!    session hours LIMIT orders keep their reservation and wait QUEUED.
//! 3. Match each activated order against the opposite side of the book.
//!
//! Matching plans against a snapshot and executes each fill in its own unit
//! of work. A version conflict re-plans from fresh state. A resting order
//! the ledger cannot fill is skipped; if the incoming order is the one that
//! cannot pay, matching it stops. Events are published after commit.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::application::dto::{
    BulkOrderRequestDto, BulkOrderResponseDto, OrderDto, UpdateOrderRequestDto,
    ValidateLotRequestDto, ValidateLotResponseDto,
};
use crate::application::ports::{
    ClockPort, EventPublisherPort, LivePricePort, Transaction, UnitOfWork, publish_or_log,
};
use crate::application::services::{
    CommissionRateProvider, DayEndReport, MarketSession, MatchLeg, OrderExecutionService,
    PortfolioLedger, SessionPhase, load_account,
};
use crate::domain::brokerage::BrokerageFirmRepository;
use crate::domain::order_execution::{
    CreateOrderCommand, Order, OrderCancelledEvent, OrderError, OrderEvent, OrderFilter,
    OrderMatchingEngine, OrderSide, OrderStatus, OrderType, Page, PageRequest, tick_size,
};
use crate::domain::portfolio::Asset;
use crate::domain::shared::{BatchId, Lots, Money, OrderId, Timestamp};
use crate::error::{EngineError, ErrorCode};

/// Order intake, matching, cancellation and amendment.
pub struct OrderService<U, E, P, R, C>
where
    U: UnitOfWork,
    E: EventPublisherPort,
    P: LivePricePort,
    R: BrokerageFirmRepository,
    C: ClockPort,
{
    uow: Arc<U>,
    event_publisher: Arc<E>,
    live_prices: Arc<P>,
    rates: Arc<CommissionRateProvider<R>>,
    clock: Arc<C>,
    ledger: Arc<PortfolioLedger>,
    executor: OrderExecutionService,
    session: Arc<MarketSession>,
    max_match_rounds: usize,
}

impl<U, E, P, R, C> OrderService<U, E, P, R, C>
where
    U: UnitOfWork,
    E: EventPublisherPort,
    P: LivePricePort,
    R: BrokerageFirmRepository,
    C: ClockPort,
{
    /// Create a new OrderService.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        uow: Arc<U>,
        event_publisher: Arc<E>,
        live_prices: Arc<P>,
        rates: Arc<CommissionRateProvider<R>>,
        clock: Arc<C>,
        ledger: Arc<PortfolioLedger>,
        executor: OrderExecutionService,
        session: Arc<MarketSession>,
        max_match_rounds: usize,
    ) -> Self {
        Self {
            uow,
            event_publisher,
            live_prices,
            rates,
            clock,
            ledger,
            executor,
            session,
            max_match_rounds,
        }
    }

    // ========================================================================
    // Intake
    // ========================================================================

    /// Enter one order per customer line and try to match them.
    ///
    /// Request-level validation failures change nothing. A line whose
    /// reservation fails is stored REJECTED; the other lines proceed.
    /// Outside session hours the accepted lines stay QUEUED, reserved, and
    /// are matched once the session opens.
    pub async fn create_bulk_order(
        &self,
        request: BulkOrderRequestDto,
    ) -> Result<BulkOrderResponseDto, EngineError> {
        if request.customer_orders.is_empty() {
            return Err(EngineError::validation(
                ErrorCode::InvalidRequest,
                "customer_orders cannot be empty",
            ));
        }
        if let Some(line) = request.customer_orders.iter().find(|l| l.lot_amount == 0) {
            return Err(EngineError::validation(
                ErrorCode::InvalidRequest,
                format!(
                    "lot_amount must be positive for account {}",
                    line.customer_account_id
                ),
            ));
        }

        let now_utc = self.clock.now();
        let phase = self.session.phase(now_utc)?;
        if phase == SessionPhase::OutOfHours && request.order_type == OrderType::Market {
            return Err(market_order_out_of_hours());
        }
        let now = Timestamp::new(now_utc);

        let asset = self.load_asset_by_code(&request.bist_code)?;
        let price = self
            .resolve_price(&asset, request.order_type, request.limit_price)
            .await?;
        let rate = self.rates.active_rate().await?;
        for line in &request.customer_orders {
            check_order_value(&asset, request.side, price, Lots::new(line.lot_amount), rate)?;
        }

        let accounts = self.uow.transact(|tx| {
            let mut accounts = Vec::with_capacity(request.customer_orders.len());
            for line in &request.customer_orders {
                accounts.push(load_account(tx, line.customer_account_id)?);
            }
            Ok(accounts)
        })?;

        let batch_id = BatchId::generate();
        let mut order_ids = Vec::with_capacity(accounts.len());
        let mut accepted = Vec::new();

        for (line, account) in request.customer_orders.iter().zip(&accounts) {
            let command = CreateOrderCommand {
                batch_id: batch_id.clone(),
                customer_account_id: account.id(),
                customer_id: account.customer_id(),
                asset_id: asset.id,
                side: request.side,
                order_type: request.order_type,
                lots: Lots::new(line.lot_amount),
                price,
                created_by: request.created_by.clone(),
            };

            let result = self.uow.transact(|tx| {
                let id = tx.next_order_id();
                let mut order = Order::new(id, command.clone(), now)?;
                tx.insert_order(&order)?;
                self.ledger.reserve_for_order(tx, &order, rate, now)?;
                if phase == SessionPhase::Open {
                    order.activate(now)?;
                    tx.update_order(&mut order)?;
                }
                Ok(order)
            });

            match result {
                Ok(order) => {
                    info!(
                        order_id = %order.id(),
                        batch_id = %batch_id,
                        account_id = %account.id(),
                        side = %order.side(),
                        lots = %order.initial_lots(),
                        price = %price,
                        status = %order.status(),
                        "Order accepted"
                    );
                    order_ids.push(order.id());
                    if order.is_open() {
                        accepted.push(order.id());
                    }
                }
                Err(reason @ EngineError::BusinessRule { .. }) => {
                    let order = self.uow.transact(|tx| {
                        let id = tx.next_order_id();
                        let mut order = Order::new(id, command.clone(), now)?;
                        order.reject(reason.to_string(), now)?;
                        tx.insert_order(&order)?;
                        Ok(order)
                    })?;
                    info!(
                        order_id = %order.id(),
                        batch_id = %batch_id,
                        account_id = %account.id(),
                        reason = %reason,
                        "Order rejected"
                    );
                    order_ids.push(order.id());
                }
                Err(e) => return Err(e),
            }
        }

        self.match_accepted(&accepted).await;

        let orders = self.uow.transact(|tx| {
            let mut orders = Vec::with_capacity(order_ids.len());
            for id in &order_ids {
                orders.push(OrderDto::from_order(&load_order(tx, *id)?));
            }
            Ok(orders)
        })?;
        Ok(BulkOrderResponseDto { batch_id, orders })
    }

    /// Dry-run check of one prospective order. Mutates nothing.
    pub async fn validate_lot(
        &self,
        request: ValidateLotRequestDto,
    ) -> Result<ValidateLotResponseDto, EngineError> {
        if request.lot_amount == 0 {
            return Ok(ValidateLotResponseDto::invalid("lot_amount must be positive"));
        }
        let lots = Lots::new(request.lot_amount);

        let (account, asset) = self.uow.transact(|tx| {
            Ok((
                tx.find_account(request.customer_account_id)?,
                tx.find_asset_by_code(&request.bist_code)?,
            ))
        })?;
        let Some(account) = account else {
            return Ok(ValidateLotResponseDto::invalid(format!(
                "Customer account {} not found",
                request.customer_account_id
            )));
        };
        let Some(asset) = asset else {
            return Ok(ValidateLotResponseDto::invalid(format!(
                "Asset {} not found",
                request.bist_code
            )));
        };
        if let Err(e) = account.ensure_active() {
            return Ok(ValidateLotResponseDto::invalid(e.to_string()));
        }

        let price = match self
            .resolve_price(&asset, request.order_type, request.limit_price)
            .await
        {
            Ok(price) => price,
            Err(e @ EngineError::Validation { .. }) => {
                return Ok(ValidateLotResponseDto::invalid(e.to_string()));
            }
            Err(e) => return Err(e),
        };
        let rate = self.rates.active_rate().await?;
        if let Err(e) = check_order_value(&asset, request.side, price, lots, rate) {
            return Ok(ValidateLotResponseDto::invalid(e.to_string()));
        }

        match request.side {
            OrderSide::Buy => {
                let required = PortfolioLedger::buy_reservation(price, lots, rate)?;
                let available = account.available_balance();
                if available < required {
                    return Ok(ValidateLotResponseDto::invalid(format!(
                        "Insufficient balance: required {required}, available {available}"
                    )));
                }
            }
            OrderSide::Sell => {
                let holding = self
                    .uow
                    .transact(|tx| Ok(tx.find_holding(account.customer_id(), asset.id)?))?;
                let available = holding.map_or(Lots::ZERO, |h| h.available_lots());
                if available < lots {
                    return Ok(ValidateLotResponseDto::invalid(format!(
                        "Insufficient lots: required {lots}, available {available}"
                    )));
                }
            }
        }

        Ok(ValidateLotResponseDto::ok())
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Match the given orders against the book, in the given order.
    ///
    /// Returns the number of fills. An order whose matching fails is marked
    /// FAILED and the rest still run. Nothing matches while the session is
    /// closed.
    pub async fn try_to_match_orders_immediately(
        &self,
        order_ids: &[OrderId],
    ) -> Result<usize, EngineError> {
        if !self.session.is_open(self.clock.now()) {
            debug!(orders = order_ids.len(), "Session closed, matching deferred");
            return Ok(0);
        }
        Ok(self.match_accepted(order_ids).await)
    }

    async fn match_accepted(&self, order_ids: &[OrderId]) -> usize {
        let mut fills = 0;
        for &order_id in order_ids {
            match self.match_incoming(order_id).await {
                Ok(n) => fills += n,
                Err(e) => error!(order_id = %order_id, error = %e, "Matching failed"),
            }
        }
        fills
    }

    async fn match_incoming(&self, order_id: OrderId) -> Result<usize, EngineError> {
        let mut skipped: HashSet<OrderId> = HashSet::new();
        let mut events = Vec::new();
        let mut fills_done = 0;
        let mut failure = None;
        let mut halted = None;

        'rounds: for round in 0..self.max_match_rounds {
            let (mut incoming, book) = self.uow.transact(|tx| {
                let incoming = load_order(tx, order_id)?;
                let book = if incoming.is_open() {
                    tx.find_open_orders(incoming.asset_id(), incoming.side().opposite())?
                } else {
                    Vec::new()
                };
                Ok((incoming, book))
            })?;
            let book: Vec<Order> = book
                .into_iter()
                .filter(|o| !skipped.contains(&o.id()))
                .collect();

            let fills = OrderMatchingEngine::match_order(&incoming, &book);
            if fills.is_empty() {
                break;
            }

            for fill in &fills {
                let Some(resting) = book.iter().find(|o| o.id() == fill.resting_order_id) else {
                    continue;
                };
                let rate = match self.rates.active_rate().await {
                    Ok(rate) => rate,
                    Err(e) => {
                        halted = Some(EngineError::from(e));
                        break 'rounds;
                    }
                };
                let now_utc = self.clock.now();
                let now = Timestamp::new(now_utc);
                let today = self.session.local_date(now_utc);

                let mut failed_leg = None;
                let result = self.uow.transact(|tx| {
                    let mut incoming = incoming.clone();
                    let mut resting = resting.clone();
                    match self
                        .executor
                        .execute_match(tx, &mut incoming, &mut resting, fill, rate, today, now)
                    {
                        Ok(records) => Ok((incoming, records)),
                        Err(e) => {
                            failed_leg = Some(e.leg);
                            Err(e.source)
                        }
                    }
                });

                match result {
                    Ok((updated, records)) => {
                        incoming = updated;
                        fills_done += 1;
                        events.extend(records.into_iter().map(|r| OrderEvent::Executed(r.event)));
                    }
                    Err(e) if e.is_retryable() => {
                        warn!(
                            order_id = %order_id,
                            resting_order_id = %resting.id(),
                            round,
                            error = %e,
                            "Conflict while matching, re-planning"
                        );
                        continue 'rounds;
                    }
                    Err(e @ EngineError::BusinessRule { .. })
                        if failed_leg == Some(MatchLeg::Incoming) =>
                    {
                        warn!(
                            order_id = %order_id,
                            resting_order_id = %resting.id(),
                            error = %e,
                            "Incoming order cannot take the fill, matching stopped"
                        );
                        break 'rounds;
                    }
                    Err(e @ EngineError::BusinessRule { .. }) => {
                        warn!(
                            order_id = %order_id,
                            resting_order_id = %resting.id(),
                            error = %e,
                            "Match candidate skipped"
                        );
                        skipped.insert(resting.id());
                        continue 'rounds;
                    }
                    Err(e) => {
                        failure = Some(e);
                        break 'rounds;
                    }
                }
            }
            break;
        }

        publish_or_log(self.event_publisher.as_ref(), events).await;

        if let Some(e) = failure {
            self.fail_order(order_id, &e)?;
            return Err(e);
        }
        if let Some(e) = halted {
            return Err(e);
        }
        Ok(fills_done)
    }

    /// Mark an order FAILED and release what it still reserves.
    fn fail_order(&self, order_id: OrderId, cause: &EngineError) -> Result<(), EngineError> {
        let now = Timestamp::new(self.clock.now());
        let failed = self.uow.transact(|tx| {
            let mut order = load_order(tx, order_id)?;
            if order.status().is_terminal() {
                return Ok(false);
            }
            order.fail(cause.to_string(), now)?;
            tx.update_order(&mut order)?;
            self.ledger.release_block_for_cancelled_order(tx, &order, now)?;
            Ok(true)
        })?;
        if failed {
            error!(order_id = %order_id, cause = %cause, "Order failed");
        }
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Cancel the open remainder of an order and release its reservation.
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<OrderDto, EngineError> {
        let now = Timestamp::new(self.clock.now());
        let (order, event) = self.uow.transact(|tx| self.cancel_in(tx, order_id, now))?;

        info!(
            order_id = %order_id,
            cancelled_lots = %event.cancelled_lots,
            "Order cancelled"
        );
        publish_or_log(
            self.event_publisher.as_ref(),
            vec![OrderEvent::Cancelled(event)],
        )
        .await;
        Ok(OrderDto::from_order(&order))
    }

    fn cancel_in(
        &self,
        tx: &mut dyn Transaction,
        order_id: OrderId,
        now: Timestamp,
    ) -> Result<(Order, OrderCancelledEvent), EngineError> {
        let mut order = load_order(tx, order_id)?;
        let asset = load_asset(tx, &order)?;
        let cancelled_lots = order.cancel(now)?;
        tx.update_order(&mut order)?;
        self.ledger.release_block_for_cancelled_order(tx, &order, now)?;

        let event = OrderCancelledEvent {
            order_id: order.id(),
            customer_id: order.customer_id(),
            asset_id: order.asset_id(),
            bist_code: asset.bist_code,
            transaction_type: order.side(),
            new_status: order.status(),
            cancelled_lots,
            event_timestamp: now,
        };
        Ok((order, event))
    }

    /// Amend type, price or quantity of a queued or open order, then re-match it.
    ///
    /// Outside session hours only QUEUED orders may be amended.
    pub async fn update_order(
        &self,
        order_id: OrderId,
        request: UpdateOrderRequestDto,
    ) -> Result<OrderDto, EngineError> {
        if request.lot_amount == 0 {
            return Err(EngineError::validation(
                ErrorCode::InvalidRequest,
                "lot_amount must be positive",
            ));
        }
        let lots = Lots::new(request.lot_amount);

        let now_utc = self.clock.now();
        let phase = self.session.phase(now_utc)?;
        if phase == SessionPhase::OutOfHours && request.order_type == OrderType::Market {
            return Err(market_order_out_of_hours());
        }
        let now = Timestamp::new(now_utc);

        let (asset, side) = self.uow.transact(|tx| {
            let order = load_order(tx, order_id)?;
            Ok((load_asset(tx, &order)?, order.side()))
        })?;
        let price = self
            .resolve_price(&asset, request.order_type, request.limit_price)
            .await?;
        let rate = self.rates.active_rate().await?;
        check_order_value(&asset, side, price, lots, rate)?;

        let updated = self.uow.transact(|tx| {
            let mut order = load_order(tx, order_id)?;
            if order.version() != request.expected_version {
                return Err(EngineError::ConcurrencyConflict {
                    message: format!(
                        "order {order_id} is at version {}, request expected {}",
                        order.version(),
                        request.expected_version
                    ),
                });
            }
            if !order.status().is_updatable() {
                return Err(OrderError::NotUpdatable {
                    status: order.status(),
                }
                .into());
            }
            if phase == SessionPhase::OutOfHours && order.status() != OrderStatus::Queued {
                return Err(EngineError::validation(
                    ErrorCode::MarketClosed,
                    format!(
                        "order {order_id} rests in the book and can only be amended during trading hours"
                    ),
                ));
            }
            self.ledger.release_block_for_cancelled_order(tx, &order, now)?;
            order.amend(request.order_type, price, lots, now)?;
            self.ledger.reserve_for_order(tx, &order, rate, now)?;
            tx.update_order(&mut order)?;
            Ok(order)
        })?;

        info!(
            order_id = %order_id,
            order_type = %updated.order_type(),
            price = %price,
            lots = %lots,
            version = updated.version(),
            "Order updated"
        );

        if updated.is_open() {
            if let Err(e) = self.match_incoming(order_id).await {
                error!(order_id = %order_id, error = %e, "Matching after update failed");
            }
        }
        self.get_order(order_id)
    }

    /// Cancel every queued or open order. Orders that fail to cancel are
    /// marked FAILED.
    pub async fn cancel_open_orders(&self) -> Result<DayEndReport, EngineError> {
        let open = self.uow.transact(|tx| {
            Ok(tx.find_orders_by_status(&[
                OrderStatus::Queued,
                OrderStatus::Active,
                OrderStatus::PartiallyFilled,
            ])?)
        })?;

        let mut report = DayEndReport::default();
        for order in open {
            match self.cancel_order(order.id()).await {
                Ok(_) => report.cancelled += 1,
                Err(e) => {
                    error!(order_id = %order.id(), error = %e, "Day-end cancel failed");
                    if let Err(fail_err) = self.fail_order(order.id(), &e) {
                        error!(order_id = %order.id(), error = %fail_err, "Could not mark order failed");
                    }
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Move every QUEUED order into the book, oldest first, and match them.
    ///
    /// Does nothing unless the session is open. Returns the number of
    /// orders activated.
    pub async fn activate_queued_orders(&self) -> Result<usize, EngineError> {
        let now_utc = self.clock.now();
        if !self.session.is_open(now_utc) {
            return Ok(0);
        }
        let now = Timestamp::new(now_utc);

        let mut queued = self
            .uow
            .transact(|tx| Ok(tx.find_orders_by_status(&[OrderStatus::Queued])?))?;
        queued.sort_by_key(|o| (o.created_at(), o.id()));

        let mut activated = Vec::with_capacity(queued.len());
        for order in queued {
            let order_id = order.id();
            let result = self.uow.transact(|tx| {
                let mut order = load_order(tx, order_id)?;
                if order.status() != OrderStatus::Queued {
                    return Ok(false);
                }
                order.activate(now)?;
                tx.update_order(&mut order)?;
                Ok(true)
            });
            match result {
                Ok(true) => activated.push(order_id),
                Ok(false) => {}
                Err(e) => error!(order_id = %order_id, error = %e, "Queued order activation failed"),
            }
        }

        if activated.is_empty() {
            return Ok(0);
        }
        let fills = self.match_accepted(&activated).await;
        info!(activated = activated.len(), fills, "Queued orders entered the book");
        Ok(activated.len())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// One order.
    pub fn get_order(&self, order_id: OrderId) -> Result<OrderDto, EngineError> {
        self.uow
            .transact(|tx| load_order(tx, order_id).map(|o| OrderDto::from_order(&o)))
    }

    /// Orders matching `filter`, newest first, one page at a time.
    pub fn list_orders(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<Page<OrderDto>, EngineError> {
        let orders = self.uow.transact(|tx| Ok(tx.find_orders(filter)?))?;
        Ok(Page::slice(orders, page).map(|o| OrderDto::from_order(&o)))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn load_asset_by_code(&self, bist_code: &str) -> Result<Asset, EngineError> {
        self.uow
            .transact(|tx| Ok(tx.find_asset_by_code(bist_code)?))?
            .ok_or_else(|| EngineError::not_found("Asset", bist_code))
    }

    /// LIMIT: the tick-checked limit price. MARKET: the live price.
    async fn resolve_price(
        &self,
        asset: &Asset,
        order_type: OrderType,
        limit_price: Option<Decimal>,
    ) -> Result<Money, EngineError> {
        match order_type {
            OrderType::Limit => {
                let price = limit_price.map(Money::new).ok_or_else(|| {
                    EngineError::validation(
                        ErrorCode::InvalidRequest,
                        "limit_price is required for LIMIT orders",
                    )
                })?;
                if !price.is_positive() {
                    return Err(EngineError::validation(
                        ErrorCode::InvalidRequest,
                        format!("limit_price must be positive, got {price}"),
                    ));
                }
                tick_size::validate_tick(price)?;
                Ok(price)
            }
            OrderType::Market => self
                .live_prices
                .live_price(&asset.bist_code)
                .await
                .map_err(|e| EngineError::Storage {
                    message: e.to_string(),
                })?
                .filter(Money::is_positive)
                .ok_or_else(|| {
                    EngineError::validation(
                        ErrorCode::InvalidRequest,
                        format!("no live price available for {}", asset.bist_code),
                    )
                }),
        }
    }
}

fn load_order(tx: &dyn Transaction, order_id: OrderId) -> Result<Order, EngineError> {
    tx.find_order(order_id)?
        .ok_or_else(|| EngineError::not_found("Order", order_id))
}

fn load_asset(tx: &dyn Transaction, order: &Order) -> Result<Asset, EngineError> {
    tx.find_asset(order.asset_id())?
        .ok_or_else(|| EngineError::not_found("Asset", order.asset_id()))
}

fn market_order_out_of_hours() -> EngineError {
    EngineError::validation(
        ErrorCode::MarketClosed,
        "MARKET orders are only accepted during trading hours",
    )
}

/// Reject an order whose value or BUY reservation is out of range, or whose
/// value exceeds the asset's cap.
fn check_order_value(
    asset: &Asset,
    side: OrderSide,
    price: Money,
    lots: Lots,
    rate: Decimal,
) -> Result<(), EngineError> {
    let value = price.checked_times_lots(lots).ok_or_else(|| {
        EngineError::validation(
            ErrorCode::InvalidRequest,
            format!("order value of {lots} lots at {price} is out of range"),
        )
    })?;
    if side == OrderSide::Buy {
        PortfolioLedger::buy_reservation(price, lots, rate)?;
    }
    let Some(cap) = asset.max_order_value else {
        return Ok(());
    };
    if value > cap {
        return Err(EngineError::validation(
            ErrorCode::MaxOrderValueExceeded,
            format!(
                "order value {value} exceeds the {} cap of {cap}",
                asset.bist_code
            ),
        ));
    }
    Ok(())
}
