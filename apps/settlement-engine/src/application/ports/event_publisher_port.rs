//! Event Publisher Port (Driven Port)
//!
//! Interface for publishing order events to external systems.

use async_trait::async_trait;

use crate::domain::order_execution::OrderEvent;

/// Event publishing error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventPublishError {
    /// Connection error.
    #[error("Event publish connection error: {message}")]
    ConnectionError {
        /// Failure description.
        message: String,
    },

    /// Serialization error.
    #[error("Event serialization error: {message}")]
    SerializationError {
        /// Failure description.
        message: String,
    },

    /// Publishing failed.
    #[error("Event publish failed: {message}")]
    PublishFailed {
        /// Failure description.
        message: String,
    },
}

/// Port for publishing order events, at-least-once.
#[async_trait]
pub trait EventPublisherPort: Send + Sync {
    /// Publish order events.
    async fn publish_order_events(&self, events: Vec<OrderEvent>) -> Result<(), EventPublishError>;

    /// Publish a single order event.
    async fn publish_order_event(&self, event: OrderEvent) -> Result<(), EventPublishError> {
        self.publish_order_events(vec![event]).await
    }
}

/// No-op event publisher.
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisherPort for NoOpEventPublisher {
    async fn publish_order_events(
        &self,
        _events: Vec<OrderEvent>,
    ) -> Result<(), EventPublishError> {
        Ok(())
    }
}

/// Publish committed events; a failure is logged and swallowed.
pub async fn publish_or_log<E>(publisher: &E, events: Vec<OrderEvent>)
where
    E: EventPublisherPort + ?Sized,
{
    if events.is_empty() {
        return;
    }
    let count = events.len();
    if let Err(e) = publisher.publish_order_events(events).await {
        tracing::warn!(error = %e, events = count, "Failed to publish order events");
    }
}
