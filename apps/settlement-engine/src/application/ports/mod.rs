//! Application Ports (Driven)

mod clock_port;
mod event_publisher_port;
mod live_price_port;
mod unit_of_work;

pub use clock_port::{ClockPort, FixedClock, SystemClock};
pub use event_publisher_port::{EventPublishError, EventPublisherPort, NoOpEventPublisher, publish_or_log};
pub use live_price_port::{LivePriceError, LivePricePort};
pub use unit_of_work::{Transaction, UnitOfWork};
