//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine, backends and event watcher produce:
//!     → logging.rs (structured log events, one span per submission)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Submission ID flows through every log line of a submit call
//! - Metrics are side effects only; nothing in the engine reads them back

pub mod logging;
pub mod metrics;
