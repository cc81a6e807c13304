//! Prometheus metrics definitions for cryptostats
//!
//! All metrics use the `cryptostats_` prefix and are read-only.

use prometheus::{
    CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

/// Prometheus metrics for the statistics core
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Cache lookups by outcome (hit, miss, coalesced)
    pub cache_lookups_total: CounterVec,
    /// Loads from the price source by symbol and result
    pub source_loads_total: CounterVec,
    /// Entries dropped from the cache by reason (expired, capacity, invalidated)
    pub cache_evictions_total: CounterVec,
    /// Number of symbols currently cached
    pub cache_entries: GenericGauge<AtomicF64>,
    /// Admission decisions (admitted, rejected)
    pub admissions_total: CounterVec,
    /// Tokens left in the shared bucket at last observation
    pub available_tokens: GenericGauge<AtomicF64>,
    /// Latency of boundary-facing operations in seconds
    pub operation_latency_seconds: HistogramVec,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let cache_lookups_total = CounterVec::new(
            Opts::new("cryptostats_cache_lookups_total", "Cache lookups by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(cache_lookups_total.clone()))?;

        let source_loads_total = CounterVec::new(
            Opts::new(
                "cryptostats_source_loads_total",
                "Price source loads by symbol and result",
            ),
            &["symbol", "result"],
        )?;
        registry.register(Box::new(source_loads_total.clone()))?;

        let cache_evictions_total = CounterVec::new(
            Opts::new(
                "cryptostats_cache_evictions_total",
                "Cache entries dropped by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(cache_evictions_total.clone()))?;

        let cache_entries = Gauge::with_opts(Opts::new(
            "cryptostats_cache_entries",
            "Number of symbols currently cached",
        ))?;
        registry.register(Box::new(cache_entries.clone()))?;

        let admissions_total = CounterVec::new(
            Opts::new(
                "cryptostats_admissions_total",
                "Rate limiter decisions by outcome",
            ),
            &["decision"],
        )?;
        registry.register(Box::new(admissions_total.clone()))?;

        let available_tokens = Gauge::with_opts(Opts::new(
            "cryptostats_available_tokens",
            "Tokens left in the shared rate limit bucket",
        ))?;
        registry.register(Box::new(available_tokens.clone()))?;

        let operation_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "cryptostats_operation_latency_seconds",
                "Statistics operation latency in seconds",
            )
            .buckets(vec![
                0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_latency_seconds.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "cryptostats_uptime_seconds",
            "Process uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            cache_lookups_total,
            source_loads_total,
            cache_evictions_total,
            cache_entries,
            admissions_total,
            available_tokens,
            operation_latency_seconds,
            uptime_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_cache_lookup(&self, outcome: &str) {
        self.cache_lookups_total.with_label_values(&[outcome]).inc();
    }

    pub fn inc_source_load(&self, symbol: &str, result: &str) {
        self.source_loads_total
            .with_label_values(&[symbol, result])
            .inc();
    }

    pub fn inc_eviction(&self, reason: &str) {
        self.cache_evictions_total
            .with_label_values(&[reason])
            .inc();
    }

    pub fn inc_admission(&self, decision: &str) {
        self.admissions_total.with_label_values(&[decision]).inc();
    }

    /// Count of cache lookups recorded for `outcome` so far
    pub fn cache_lookups(&self, outcome: &str) -> u64 {
        self.cache_lookups_total.with_label_values(&[outcome]).get() as u64
    }

    pub fn source_loads(&self, symbol: &str, result: &str) -> u64 {
        self.source_loads_total
            .with_label_values(&[symbol, result])
            .get() as u64
    }

    pub fn admissions(&self, decision: &str) -> u64 {
        self.admissions_total.with_label_values(&[decision]).get() as u64
    }
}
