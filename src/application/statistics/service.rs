use crate::application::statistics::engine::{MonthStatistics, StatisticsEngine, SymbolStatistics};
use crate::domain::errors::StatsError;
use crate::domain::market::{AnnotatedPricePoint, PricePoint, Symbol};
use crate::infrastructure::core::TokenBucket;
use crate::infrastructure::observability::{Metrics, OperationTimer};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

/// Boundary-facing operations. Each one is admitted by the shared token bucket
/// before the engine is touched; a rejected call does no work at all.
#[derive(Clone)]
pub struct StatisticsService {
    engine: StatisticsEngine,
    bucket: Arc<TokenBucket>,
    metrics: Option<Metrics>,
}

impl std::fmt::Debug for StatisticsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsService")
            .field("engine", &self.engine)
            .field("bucket", &self.bucket)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl StatisticsService {
    pub fn new(engine: StatisticsEngine, bucket: Arc<TokenBucket>) -> Self {
        Self {
            engine,
            bucket,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn engine(&self) -> &StatisticsEngine {
        &self.engine
    }

    pub fn bucket(&self) -> &Arc<TokenBucket> {
        &self.bucket
    }

    pub async fn get_sorted_cryptos_by_normalized_range(
        &self,
    ) -> Result<Vec<AnnotatedPricePoint>, StatsError> {
        let _timer = self.admit("sorted")?;
        info!("Request: get_sorted_cryptos_by_normalized_range");
        self.engine.calculate_normalized_ranges_and_sort().await
    }

    pub async fn get_statistics_for_crypto(
        &self,
        symbol: Symbol,
    ) -> Result<SymbolStatistics, StatsError> {
        let _timer = self.admit("symbol_statistics")?;
        info!("Request: get_statistics_for_crypto symbol={}", symbol);
        self.engine.statistics_for_symbol(symbol).await
    }

    pub async fn get_statistics_for_month_and_year(
        &self,
        year: i32,
        month: u32,
    ) -> Result<MonthStatistics, StatsError> {
        let _timer = self.admit("month_statistics")?;
        info!(
            "Request: get_statistics_for_month_and_year year={} month={}",
            year, month
        );
        self.engine.statistics_by_month_and_year(year, month).await
    }

    pub async fn get_highest_normalized_range(
        &self,
        date: NaiveDate,
    ) -> Result<AnnotatedPricePoint, StatsError> {
        let _timer = self.admit("highest_normalized_range")?;
        info!("Request: get_highest_normalized_range date={}", date);
        self.engine.crypto_with_highest_normalized_range(date).await
    }

    pub async fn get_all_prices(&self, symbols: &[Symbol]) -> Result<Vec<PricePoint>, StatsError> {
        let _timer = self.admit("all_prices")?;
        info!("Request: get_all_prices symbols={:?}", symbols);
        self.engine.all_prices(symbols).await
    }

    /// Takes a token, then starts timing the operation if metrics are attached.
    fn admit(&self, operation: &'static str) -> Result<Option<OperationTimer>, StatsError> {
        self.bucket.admit()?;
        Ok(self
            .metrics
            .as_ref()
            .map(|metrics| OperationTimer::start(metrics, operation)))
    }
}
