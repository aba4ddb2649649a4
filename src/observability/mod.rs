//! Observability
//!
//! Structured submission events and round metrics.

pub mod events;
pub mod metrics;

pub use events::{emit, init_event_journal, EventSeverity, HarnessEvent, HarnessEventType};
pub use metrics::{HarnessMetrics, MetricsSnapshot};
