//! Observability: structured logging, typed events and counters.
//!
//! ```ignore
//! use dynamo_admin::observability::{log_event, Event, MetricsRegistry};
//!
//! log_event(Event::PageComplete, &[("table", "users"), ("records", "25")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_pages_served();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log `event` at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
