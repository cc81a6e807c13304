use crate::application::market_data::PriceCache;
use crate::domain::errors::StatsError;
use crate::domain::market::{AnnotatedPricePoint, PricePoint, PriceSeries, Symbol};
use crate::domain::statistics::{self, StatisticKind};
use chrono::NaiveDate;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use tracing::debug;

/// Extrema of one symbol's full series.
pub type SymbolStatistics = BTreeMap<StatisticKind, AnnotatedPricePoint>;

/// Extrema of every symbol within one month, grouped by kind in symbol order.
pub type MonthStatistics = BTreeMap<StatisticKind, Vec<AnnotatedPricePoint>>;

/// Computes aggregates over cached price series.
///
/// Every entry point goes through the cache, so the source is read at most
/// once per symbol per TTL. Annotated points are built fresh on each call.
#[derive(Debug, Clone)]
pub struct StatisticsEngine {
    cache: PriceCache,
}

impl StatisticsEngine {
    pub fn new(cache: PriceCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    /// Every point of every symbol, tagged with its symbol's normalized range,
    /// sorted descending by that range. Ties keep symbol order then file order.
    pub async fn calculate_normalized_ranges_and_sort(
        &self,
    ) -> Result<Vec<AnnotatedPricePoint>, StatsError> {
        let mut annotated = Vec::new();
        for (symbol, series) in self.load_all(&Symbol::ALL).await? {
            if series.is_empty() {
                debug!("StatisticsEngine: {} has no price points, skipping", symbol);
                continue;
            }
            let range = statistics::normalized_range(symbol, &series)?;
            annotated.extend(series.iter().map(|p| p.annotate(range)));
        }

        annotated.sort_by(|a, b| b.normalized_range.total_cmp(&a.normalized_range));
        Ok(annotated)
    }

    /// Oldest, newest, min and max of `symbol`'s full series.
    pub async fn statistics_for_symbol(
        &self,
        symbol: Symbol,
    ) -> Result<SymbolStatistics, StatsError> {
        let series = self.cache.get_or_load(symbol).await?;
        let range = statistics::normalized_range(symbol, &series)?;
        let extrema = statistics::extrema(series.iter()).ok_or_else(|| StatsError::Domain {
            symbol,
            reason: "no price points loaded".to_string(),
        })?;

        Ok(extrema
            .iter()
            .map(|(kind, point)| (kind, point.annotate(range)))
            .collect())
    }

    /// Extrema per symbol restricted to one calendar month (UTC).
    ///
    /// The month is validated before any series is loaded. Symbols with no
    /// points in the month contribute nothing, but every kind is present.
    pub async fn statistics_by_month_and_year(
        &self,
        year: i32,
        month: u32,
    ) -> Result<MonthStatistics, StatsError> {
        let (start, end) = statistics::month_bounds(year, month)?;

        let mut result: MonthStatistics = StatisticKind::ALL
            .into_iter()
            .map(|kind| (kind, Vec::new()))
            .collect();

        for (symbol, series) in self.load_all(&Symbol::ALL).await? {
            let in_month = series
                .iter()
                .filter(|p| p.timestamp >= start && p.timestamp <= end);
            let Some(extrema) = statistics::extrema(in_month) else {
                continue;
            };
            let range = statistics::normalized_range(symbol, &series)?;
            for (kind, point) in extrema.iter() {
                result.entry(kind).or_default().push(point.annotate(range));
            }
        }

        Ok(result)
    }

    /// The point with the highest normalized range among those observed on `date`.
    pub async fn crypto_with_highest_normalized_range(
        &self,
        date: NaiveDate,
    ) -> Result<AnnotatedPricePoint, StatsError> {
        self.calculate_normalized_ranges_and_sort()
            .await?
            .into_iter()
            .find(|p| p.date() == date)
            .ok_or(StatsError::DateNotFound { date })
    }

    /// Raw prices of `symbols` in the given order, each in file order.
    /// An empty slice means every symbol.
    pub async fn all_prices(&self, symbols: &[Symbol]) -> Result<Vec<PricePoint>, StatsError> {
        let symbols: &[Symbol] = if symbols.is_empty() {
            &Symbol::ALL
        } else {
            symbols
        };

        Ok(self
            .load_all(symbols)
            .await?
            .into_iter()
            .flat_map(|(_, series)| series.iter().copied().collect::<Vec<_>>())
            .collect())
    }

    async fn load_all(&self, symbols: &[Symbol]) -> Result<Vec<(Symbol, PriceSeries)>, StatsError> {
        try_join_all(symbols.iter().map(|&symbol| async move {
            self.cache
                .get_or_load(symbol)
                .await
                .map(|series| (symbol, series))
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::{ManualClock, MockPriceSource};
    use std::sync::Arc;
    use std::time::Duration;

    // 2022-01-01 04:00, 2022-01-02 04:00, 2022-01-03 04:00 UTC
    const T1: i64 = 1_641_009_600_000;
    const T2: i64 = 1_641_096_000_000;
    const T3: i64 = 1_641_182_400_000;
    // 2022-02-01 00:00 UTC
    const FEB_1: i64 = 1_643_673_600_000;

    fn engine_for(source: MockPriceSource) -> StatisticsEngine {
        let cache = PriceCache::new(
            Arc::new(source),
            Arc::new(ManualClock::new()),
            Duration::from_secs(600),
            10,
        );
        StatisticsEngine::new(cache)
    }

    fn btc_eth() -> MockPriceSource {
        let source = MockPriceSource::new()
            .with_series(Symbol::Btc, &[(T1, 2000.0), (T2, 2500.0), (T3, 1800.0)])
            .with_series(Symbol::Eth, &[(T1, 4000.0), (T2, 4200.0)]);
        for symbol in [Symbol::Doge, Symbol::Ltc, Symbol::Xrp] {
            source.set_series(symbol, Vec::new());
        }
        source
    }

    #[tokio::test]
    async fn test_sorted_by_normalized_range() {
        let engine = engine_for(btc_eth());
        let sorted = engine.calculate_normalized_ranges_and_sort().await.unwrap();

        assert_eq!(sorted.len(), 5);
        assert!(sorted[..3].iter().all(|p| p.symbol() == Symbol::Btc));
        assert!(sorted[3..].iter().all(|p| p.symbol() == Symbol::Eth));
        assert!((sorted[0].normalized_range - 0.3889).abs() < 1e-4);
        assert!((sorted[4].normalized_range - 0.05).abs() < 1e-9);
        assert!(
            sorted
                .windows(2)
                .all(|w| w[0].normalized_range >= w[1].normalized_range)
        );
        // file order preserved within a symbol
        assert_eq!(sorted[0].price(), 2000.0);
        assert_eq!(sorted[2].price(), 1800.0);
    }

    #[tokio::test]
    async fn test_statistics_for_symbol() {
        let engine = engine_for(btc_eth());
        let stats = engine.statistics_for_symbol(Symbol::Btc).await.unwrap();

        assert_eq!(stats.len(), 4);
        assert_eq!(stats[&StatisticKind::Oldest].price(), 2000.0);
        assert_eq!(stats[&StatisticKind::Newest].price(), 1800.0);
        assert_eq!(stats[&StatisticKind::Min].price(), 1800.0);
        assert_eq!(stats[&StatisticKind::Max].price(), 2500.0);
        let range = stats[&StatisticKind::Min].normalized_range;
        assert!(stats.values().all(|p| p.normalized_range == range));
    }

    #[tokio::test]
    async fn test_statistics_for_empty_symbol() {
        let engine = engine_for(btc_eth());
        let err = engine.statistics_for_symbol(Symbol::Doge).await.unwrap_err();
        assert_eq!(err.code(), "DOMAIN_ERROR");
    }

    #[tokio::test]
    async fn test_month_statistics() {
        let source = btc_eth();
        source.set_series(
            Symbol::Ltc,
            vec![PricePoint::new(
                chrono::DateTime::from_timestamp_millis(FEB_1).unwrap(),
                Symbol::Ltc,
                150.0,
            )],
        );
        let engine = engine_for(source);

        let january = engine.statistics_by_month_and_year(2022, 1).await.unwrap();
        assert_eq!(january.len(), 4);
        let max: Vec<_> = january[&StatisticKind::Max].iter().map(|p| p.symbol()).collect();
        assert_eq!(max, vec![Symbol::Btc, Symbol::Eth]);

        let february = engine.statistics_by_month_and_year(2022, 2).await.unwrap();
        assert_eq!(february[&StatisticKind::Oldest].len(), 1);
        assert_eq!(february[&StatisticKind::Oldest][0].symbol(), Symbol::Ltc);

        let march = engine.statistics_by_month_and_year(2022, 3).await.unwrap();
        assert_eq!(march.len(), 4);
        assert!(march.values().all(Vec::is_empty));
    }

    #[tokio::test]
    async fn test_month_validation_skips_cache() {
        let source = btc_eth();
        let engine = engine_for(source.clone());

        assert!(matches!(
            engine.statistics_by_month_and_year(2022, 13).await,
            Err(StatsError::InvalidDate { .. })
        ));
        assert!(matches!(
            engine.statistics_by_month_and_year(-1, 5).await,
            Err(StatsError::InvalidDate { .. })
        ));
        assert_eq!(source.total_loads(), 0);
        assert!(engine.cache().is_empty());
    }

    #[tokio::test]
    async fn test_highest_normalized_range_on_date() {
        let engine = engine_for(btc_eth());

        let date = NaiveDate::from_ymd_opt(2022, 1, 2).unwrap();
        let best = engine.crypto_with_highest_normalized_range(date).await.unwrap();
        assert_eq!(best.symbol(), Symbol::Btc);
        assert_eq!(best.price(), 2500.0);

        let missing = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        assert!(matches!(
            engine.crypto_with_highest_normalized_range(missing).await,
            Err(StatsError::DateNotFound { date }) if date == missing
        ));
    }

    #[tokio::test]
    async fn test_all_prices() {
        let engine = engine_for(btc_eth());

        let eth_then_btc = engine.all_prices(&[Symbol::Eth, Symbol::Btc]).await.unwrap();
        let prices: Vec<f64> = eth_then_btc.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![4000.0, 4200.0, 2000.0, 2500.0, 1800.0]);

        let everything = engine.all_prices(&[]).await.unwrap();
        assert_eq!(everything.len(), 5);
        assert_eq!(everything[0].symbol, Symbol::Btc);
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let source = btc_eth();
        source.fail_next(
            Symbol::Xrp,
            1,
            StatsError::SourceUnavailable {
                symbol: Symbol::Xrp,
                reason: "missing".to_string(),
            },
        );
        let engine = engine_for(source);

        let err = engine.calculate_normalized_ranges_and_sort().await.unwrap_err();
        assert_eq!(err.code(), "SOURCE_UNAVAILABLE");
        // retried on the next call
        assert!(engine.calculate_normalized_ranges_and_sort().await.is_ok());
    }
}
