//! Queued Order Activator
//!
//! LIMIT orders entered outside session hours wait QUEUED with their
//! reservation held. This task moves them into the book once the session
//! opens and matches them.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::application::ports::{ClockPort, EventPublisherPort, LivePricePort, UnitOfWork};
use crate::application::use_cases::OrderService;
use crate::domain::brokerage::BrokerageFirmRepository;

/// Background activation of queued orders.
pub struct QueuedOrderActivator<U, E, P, R, C>
where
    U: UnitOfWork,
    E: EventPublisherPort,
    P: LivePricePort,
    R: BrokerageFirmRepository,
    C: ClockPort,
{
    orders: Arc<OrderService<U, E, P, R, C>>,
    every: Duration,
}

impl<U, E, P, R, C> QueuedOrderActivator<U, E, P, R, C>
where
    U: UnitOfWork,
    E: EventPublisherPort,
    P: LivePricePort,
    R: BrokerageFirmRepository,
    C: ClockPort,
{
    /// Create the activator; it checks for queued orders every `every`.
    pub const fn new(orders: Arc<OrderService<U, E, P, R, C>>, every: Duration) -> Self {
        Self { orders, every }
    }

    /// Activate whatever is queued, if the session is open.
    ///
    /// Returns the number of orders activated; errors are logged.
    pub async fn activate_once(&self) -> usize {
        match self.orders.activate_queued_orders().await {
            Ok(activated) => activated,
            Err(e) => {
                error!(error = %e, "Queued order activation failed");
                0
            }
        }
    }

    /// Check on every tick until `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(interval_secs = self.every.as_secs(), "Starting queued order activator");

        let mut interval = tokio::time::interval(self.every);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.activate_once().await;
                }
                () = shutdown.cancelled() => {
                    info!("Queued order activator shutting down");
                    break;
                }
            }
        }
    }
}
