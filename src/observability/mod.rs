//! Observability for the experiment service
//!
//! - Structured logging (JSON lines)
//! - Per-site visit and submission counters
//!
//! # Principles
//!
//! 1. Observability never changes a request's outcome
//! 2. Logging failures are ignored
//! 3. Counters are lock-free
//!
//! # Usage
//!
//! ```ignore
//! use abform::experiment::Variant;
//! use abform::observability::{Event, ExperimentMetrics, Logger};
//!
//! Logger::info(Event::ExperimentConfigSaved, &[("version", "3")]);
//!
//! let metrics = ExperimentMetrics::new();
//! metrics.record_visit(Variant::A);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{ExperimentMetrics, MetricsSnapshot};
