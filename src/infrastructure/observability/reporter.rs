//! Push-based metrics reporter
//!
//! Periodically logs cache and rate limiter state as one line of JSON.
//! Nothing is served; data only flows out.

use crate::application::market_data::{CacheStats, PriceCache};
use crate::infrastructure::core::TokenBucket;
use crate::infrastructure::observability::metrics::Metrics;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Metrics snapshot for JSON output
#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub cache: CacheSnapshot,
    pub rate_limit: RateLimitSnapshot,
}

#[derive(Serialize)]
pub struct CacheSnapshot {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
}

#[derive(Serialize)]
pub struct RateLimitSnapshot {
    pub capacity: u64,
    pub available_tokens: u64,
    pub refill_interval_secs: u64,
    pub admitted: u64,
    pub rejected: u64,
}

pub struct MetricsReporter {
    cache: PriceCache,
    bucket: Arc<TokenBucket>,
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    /// # Arguments
    /// * `cache` - Cache whose occupancy is reported
    /// * `bucket` - Shared admission bucket
    /// * `metrics` - Prometheus metrics the counters are read from
    /// * `interval_seconds` - How often to output metrics
    pub fn new(
        cache: PriceCache,
        bucket: Arc<TokenBucket>,
        metrics: Metrics,
        interval_seconds: u64,
    ) -> Self {
        Self {
            cache,
            bucket,
            metrics,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds),
        }
    }

    /// Run the reporter in a loop, outputting metrics periodically
    pub async fn run(self) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            let snapshot = self.collect_snapshot();
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    info!(target: "cryptostats::metrics", "METRICS_JSON:{}", json);
                    info!(
                        "Cache: {}/{} entries | Tokens: {}/{} | Uptime: {}s",
                        snapshot.cache.stats.entries,
                        snapshot.cache.stats.max_entries,
                        snapshot.rate_limit.available_tokens,
                        snapshot.rate_limit.capacity,
                        snapshot.uptime_seconds
                    );
                }
                Err(e) => warn!("Failed to serialize metrics: {}", e),
            }
        }
    }

    fn collect_snapshot(&self) -> MetricsSnapshot {
        let uptime = self.start_time.elapsed().as_secs();
        let stats = self.cache.stats();
        let available = self.bucket.available_tokens();

        self.metrics.uptime_seconds.set(uptime as f64);
        self.metrics.cache_entries.set(stats.entries as f64);
        self.metrics.available_tokens.set(available as f64);

        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            cache: CacheSnapshot {
                stats,
                hits: self.metrics.cache_lookups("hit"),
                misses: self.metrics.cache_lookups("miss"),
                coalesced: self.metrics.cache_lookups("coalesced"),
            },
            rate_limit: RateLimitSnapshot {
                capacity: self.bucket.capacity(),
                available_tokens: available,
                refill_interval_secs: self.bucket.refill_interval().as_secs(),
                admitted: self.metrics.admissions("admitted"),
                rejected: self.metrics.admissions("rejected"),
            },
        }
    }
}
