//! Push-based observability
//!
//! Metrics live in a Prometheus registry and are pushed out as periodic
//! structured JSON log lines. There is no HTTP endpoint.

pub mod latency_tracker;
pub mod metrics;
pub mod reporter;

pub use latency_tracker::OperationTimer;
pub use metrics::Metrics;
pub use reporter::MetricsReporter;
