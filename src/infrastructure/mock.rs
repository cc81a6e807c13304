use crate::domain::errors::StatsError;
use crate::domain::market::{PricePoint, Symbol};
use crate::domain::ports::{Clock, PriceSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;

/// In-memory price source for tests and demos.
///
/// Counts every load, can delay each load to widen race windows, and can be
/// told to fail the next N loads of a symbol.
#[derive(Clone, Default)]
pub struct MockPriceSource {
    series: Arc<Mutex<HashMap<Symbol, Vec<PricePoint>>>>,
    failures: Arc<Mutex<HashMap<Symbol, (usize, StatsError)>>>,
    loads: Arc<Mutex<HashMap<Symbol, usize>>>,
    total_loads: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every load sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Adds rows given as `(epoch millis, price)`.
    pub fn with_series(self, symbol: Symbol, rows: &[(i64, f64)]) -> Self {
        let points = rows
            .iter()
            .filter_map(|&(millis, price)| {
                DateTime::<Utc>::from_timestamp_millis(millis)
                    .map(|ts| PricePoint::new(ts, symbol, price))
            })
            .collect();
        self.set_series(symbol, points);
        self
    }

    pub fn set_series(&self, symbol: Symbol, points: Vec<PricePoint>) {
        lock(&self.series).insert(symbol, points);
    }

    /// The next `times` loads of `symbol` fail with `error`.
    pub fn fail_next(&self, symbol: Symbol, times: usize, error: StatsError) {
        let mut failures = lock(&self.failures);
        if times == 0 {
            failures.remove(&symbol);
        } else {
            failures.insert(symbol, (times, error));
        }
    }

    pub fn load_count(&self, symbol: Symbol) -> usize {
        lock(&self.loads).get(&symbol).copied().unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.total_loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn load(&self, symbol: Symbol) -> Result<Vec<PricePoint>, StatsError> {
        *lock(&self.loads).entry(symbol).or_insert(0) += 1;
        self.total_loads.fetch_add(1, Ordering::SeqCst);
        info!("MockPriceSource: loading {}", symbol);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut failures = lock(&self.failures);
            if let Some((remaining, error)) = failures.get_mut(&symbol) {
                let error = error.clone();
                *remaining -= 1;
                if *remaining == 0 {
                    failures.remove(&symbol);
                }
                return Err(error);
            }
        }

        lock(&self.series)
            .get(&symbol)
            .cloned()
            .ok_or_else(|| StatsError::SourceUnavailable {
                symbol,
                reason: "no mock series registered".to_string(),
            })
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *lock(&self.offset) += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *lock(&self.offset)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
