use crate::infrastructure::observability::Metrics;
use prometheus::Histogram;
use std::time::{Duration, Instant};
use tracing::debug;

/// Times one statistics operation, from admission until the guard is dropped,
/// into `cryptostats_operation_latency_seconds{operation}`.
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
    histogram: Histogram,
}

impl OperationTimer {
    pub fn start(metrics: &Metrics, operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
            histogram: metrics
                .operation_latency_seconds
                .with_label_values(&[operation]),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        self.histogram.observe(elapsed.as_secs_f64());
        debug!("{} finished in {:?}", self.operation, elapsed);
    }
}
