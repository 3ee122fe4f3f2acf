//! Observability
//!
//! Structured JSON logging plus counters. Observability is read-only and
//! never changes the outcome of a query.
//!
//! ```ignore
//! use tenantql::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::QueryReceived, &[("tenant_id", "T1")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_queries_executed();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{LogLevel, Logger};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a pipeline event at its own level
pub fn log_event(event: Event) {
    Logger::log(event.level(), event.as_str(), &[]);
}

/// Log a pipeline event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.level(), event.as_str(), fields);
}
