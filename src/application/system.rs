use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::application::market_data::PriceCache;
use crate::application::statistics::{StatisticsEngine, StatisticsService};
use crate::config::Config;
use crate::domain::ports::{Clock, PriceSource};
use crate::infrastructure::core::{SystemClock, TokenBucket};
use crate::infrastructure::observability::{Metrics, MetricsReporter};
use crate::infrastructure::CsvPriceSource;

/// Fully wired statistics core: cache, bucket and service sharing one set of metrics.
pub struct Application {
    pub config: Config,
    pub metrics: Metrics,
    pub cache: PriceCache,
    pub bucket: Arc<TokenBucket>,
    pub service: StatisticsService,
}

impl Application {
    /// Builds the application over the CSV files in `config.source.prices_dir`.
    pub fn build(config: Config) -> Result<Self> {
        info!(
            "Building cryptostats (prices dir: {})",
            config.source.prices_dir.display()
        );
        let source = Arc::new(CsvPriceSource::new(config.source.prices_dir.clone()));
        Self::build_with(config, source, Arc::new(SystemClock))
    }

    /// Builds the application over an arbitrary source and clock.
    pub fn build_with(
        config: Config,
        source: Arc<dyn PriceSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let metrics = Metrics::new().context("Failed to create metrics registry")?;

        let cache = PriceCache::with_metrics(
            source,
            clock.clone(),
            config.cache.ttl(),
            config.cache.max_entries,
            metrics.clone(),
        );
        info!(
            "Price cache ready (ttl: {}m, max entries: {})",
            config.cache.ttl_minutes, config.cache.max_entries
        );

        let bucket = Arc::new(
            TokenBucket::new(
                config.rate_limit.capacity,
                config.rate_limit.refill_tokens,
                config.rate_limit.refill_interval(),
                clock,
            )
            .with_metrics(metrics.clone()),
        );
        info!(
            "Rate limiter ready ({} tokens, {} per {}s)",
            config.rate_limit.capacity,
            config.rate_limit.refill_tokens,
            config.rate_limit.refill_interval_seconds
        );

        let service = StatisticsService::new(StatisticsEngine::new(cache.clone()), bucket.clone())
            .with_metrics(metrics.clone());

        Ok(Self {
            config,
            metrics,
            cache,
            bucket,
            service,
        })
    }

    /// Spawns the background tasks: the expiry sweeper and, when enabled, the
    /// metrics reporter. Must be called from within a tokio runtime.
    pub fn start(&self) -> BackgroundTasks {
        let cache = self.cache.clone();
        let period = self.config.cache.ttl().max(Duration::from_secs(1));
        let sweeper = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.evict_expired();
            }
        });

        let reporter = if self.config.observability.enabled {
            let reporter = MetricsReporter::new(
                self.cache.clone(),
                self.bucket.clone(),
                self.metrics.clone(),
                self.config.observability.interval_seconds,
            );
            Some(tokio::spawn(async move { reporter.run().await }))
        } else {
            info!("Metrics reporter disabled");
            None
        };

        BackgroundTasks { sweeper, reporter }
    }
}

/// Handles of the tasks spawned by [`Application::start`]; aborted on drop.
pub struct BackgroundTasks {
    sweeper: JoinHandle<()>,
    reporter: Option<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn reporter_running(&self) -> bool {
        self.reporter.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.sweeper.abort();
        if let Some(reporter) = &self.reporter {
            reporter.abort();
        }
    }
}
