//! Event publisher adapters.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::application::ports::{EventPublishError, EventPublisherPort};
use crate::domain::order_execution::OrderEvent;

/// Writes every event to the log as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisherPort for TracingEventPublisher {
    async fn publish_order_events(&self, events: Vec<OrderEvent>) -> Result<(), EventPublishError> {
        for event in events {
            let payload = serde_json::to_string(&event).map_err(|e| {
                EventPublishError::SerializationError {
                    message: e.to_string(),
                }
            })?;
            tracing::info!(
                event_type = event.event_type(),
                order_id = %event.order_id(),
                payload = %payload,
                "Order event"
            );
        }
        Ok(())
    }
}

/// Keeps published events in memory.
#[derive(Debug, Default)]
pub struct InMemoryEventPublisher {
    events: Mutex<Vec<OrderEvent>>,
    failing: Mutex<bool>,
}

impl InMemoryEventPublisher {
    /// Create an empty publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far.
    #[must_use]
    pub fn events(&self) -> Vec<OrderEvent> {
        self.events.lock().clone()
    }

    /// Make subsequent publishes fail.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

#[async_trait]
impl EventPublisherPort for InMemoryEventPublisher {
    async fn publish_order_events(&self, events: Vec<OrderEvent>) -> Result<(), EventPublishError> {
        if *self.failing.lock() {
            return Err(EventPublishError::ConnectionError {
                message: "publisher unavailable".to_string(),
            });
        }
        self.events.lock().extend(events);
        Ok(())
    }
}
