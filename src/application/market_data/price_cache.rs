use crate::domain::errors::StatsError;
use crate::domain::market::{PriceSeries, Symbol};
use crate::domain::ports::{Clock, PriceSource};
use crate::infrastructure::observability::Metrics;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

type PendingLoad = Shared<BoxFuture<'static, Result<PriceSeries, StatsError>>>;

struct CacheEntry {
    series: PriceSeries,
    inserted_at: Instant,
    last_access: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<Symbol, CacheEntry>,
    in_flight: HashMap<Symbol, PendingLoad>,
    tick: u64,
}

struct CacheInner {
    source: Arc<dyn PriceSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    max_entries: usize,
    state: Mutex<CacheState>,
    metrics: Option<Metrics>,
}

/// Point-in-time view of the cache for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub in_flight: usize,
    pub max_entries: usize,
    pub ttl_secs: u64,
    pub symbols: Vec<Symbol>,
}

/// Read-through cache of full price series, keyed by symbol.
///
/// Entries expire `ttl` after insertion and at most `max_entries` symbols are
/// held; a full cache drops expired entries first, then the least recently
/// used one. Concurrent misses for the same symbol share a single load, and a
/// failed load is handed to every waiter without being stored.
#[derive(Clone)]
pub struct PriceCache {
    inner: Arc<CacheInner>,
}

impl std::fmt::Debug for PriceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceCache")
            .field("ttl", &self.inner.ttl)
            .field("max_entries", &self.inner.max_entries)
            .field("state", &"<Mutex>")
            .finish()
    }
}

impl PriceCache {
    pub fn new(
        source: Arc<dyn PriceSource>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        max_entries: usize,
    ) -> Self {
        Self::build(source, clock, ttl, max_entries, None)
    }

    pub fn with_metrics(
        source: Arc<dyn PriceSource>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        max_entries: usize,
        metrics: Metrics,
    ) -> Self {
        Self::build(source, clock, ttl, max_entries, Some(metrics))
    }

    fn build(
        source: Arc<dyn PriceSource>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        max_entries: usize,
        metrics: Option<Metrics>,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                clock,
                ttl,
                max_entries: max_entries.max(1),
                state: Mutex::new(CacheState::default()),
                metrics,
            }),
        }
    }

    /// Returns the cached series for `symbol`, loading it on a miss.
    pub async fn get_or_load(&self, symbol: Symbol) -> Result<PriceSeries, StatsError> {
        let pending = {
            let mut state = self.inner.lock_state();
            let now = self.inner.clock.now();
            state.tick += 1;
            let tick = state.tick;

            let fresh = state
                .entries
                .get(&symbol)
                .map(|entry| self.inner.is_fresh(entry, now));
            let hit = match fresh {
                Some(true) => state.entries.get_mut(&symbol).map(|entry| {
                    entry.last_access = tick;
                    entry.series.clone()
                }),
                Some(false) => {
                    state.entries.remove(&symbol);
                    self.inner.record_eviction("expired", state.entries.len());
                    debug!("PriceCache: entry for {} expired", symbol);
                    None
                }
                None => None,
            };
            if let Some(series) = hit {
                drop(state);
                debug!("PriceCache: hit for {}", symbol);
                self.inner.record_lookup("hit");
                return Ok(series);
            }

            match state.in_flight.get(&symbol).cloned() {
                Some(pending) => {
                    self.inner.record_lookup("coalesced");
                    pending
                }
                None => {
                    self.inner.record_lookup("miss");
                    let pending = CacheInner::start_load(&self.inner, symbol);
                    state.in_flight.insert(symbol, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Drops every entry whose age has reached the TTL. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let mut state = self.inner.lock_state();
        let now = self.inner.clock.now();
        let removed = self.inner.purge_expired(&mut state, now);
        if removed > 0 {
            info!("PriceCache: evicted {} expired entries", removed);
        }
        removed
    }

    pub fn invalidate(&self, symbol: Symbol) -> bool {
        let mut state = self.inner.lock_state();
        let removed = state.entries.remove(&symbol).is_some();
        if removed {
            self.inner.record_eviction("invalidated", state.entries.len());
        }
        removed
    }

    /// Empties the cache. Loads already in flight still complete and store their result.
    pub fn clear(&self) {
        let mut state = self.inner.lock_state();
        let count = state.entries.len();
        state.entries.clear();
        if let Some(metrics) = &self.inner.metrics {
            metrics
                .cache_evictions_total
                .with_label_values(&["invalidated"])
                .inc_by(count as f64);
            metrics.cache_entries.set(0.0);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.inner.lock_state().entries.contains_key(&symbol)
    }

    /// Cached symbols in canonical order.
    pub fn cached_symbols(&self) -> Vec<Symbol> {
        let state = self.inner.lock_state();
        let mut symbols: Vec<Symbol> = state.entries.keys().copied().collect();
        symbols.sort();
        symbols
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.inner.max_entries
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.inner.lock_state();
        let mut symbols: Vec<Symbol> = state.entries.keys().copied().collect();
        symbols.sort();
        CacheStats {
            entries: state.entries.len(),
            in_flight: state.in_flight.len(),
            max_entries: self.inner.max_entries,
            ttl_secs: self.inner.ttl.as_secs(),
            symbols,
        }
    }
}

impl CacheInner {
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("PriceCache: Lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) < self.ttl
    }

    /// Builds the shared load future for `symbol`. Whichever waiter drives it
    /// to completion also publishes the result and clears the in-flight slot.
    fn start_load(this: &Arc<Self>, symbol: Symbol) -> PendingLoad {
        let source = this.source.clone();
        let metrics = this.metrics.clone();
        let cache: Weak<CacheInner> = Arc::downgrade(this);

        async move {
            info!("PriceCache: loading {} from source", symbol);
            let result = source.load(symbol).await.map(PriceSeries::from);

            if let Some(metrics) = &metrics {
                let outcome = if result.is_ok() { "ok" } else { "error" };
                metrics.inc_source_load(symbol.as_str(), outcome);
            }

            if let Some(cache) = cache.upgrade() {
                let mut state = cache.lock_state();
                state.in_flight.remove(&symbol);
                match &result {
                    Ok(series) => cache.store(&mut state, symbol, series.clone()),
                    Err(e) => warn!("PriceCache: load for {} failed: {}", symbol, e),
                }
            }

            result
        }
        .boxed()
        .shared()
    }

    fn store(&self, state: &mut CacheState, symbol: Symbol, series: PriceSeries) {
        let now = self.clock.now();

        if !state.entries.contains_key(&symbol) && state.entries.len() >= self.max_entries {
            self.purge_expired(state, now);
        }
        if !state.entries.contains_key(&symbol) && state.entries.len() >= self.max_entries {
            let lru = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| *key);
            if let Some(victim) = lru {
                state.entries.remove(&victim);
                info!("PriceCache: evicted {} (capacity {})", victim, self.max_entries);
                self.record_eviction("capacity", state.entries.len());
            }
        }

        state.tick += 1;
        let tick = state.tick;
        state.entries.insert(
            symbol,
            CacheEntry {
                series,
                inserted_at: now,
                last_access: tick,
            },
        );
        if let Some(metrics) = &self.metrics {
            metrics.cache_entries.set(state.entries.len() as f64);
        }
    }

    fn purge_expired(&self, state: &mut CacheState, now: Instant) -> usize {
        let before = state.entries.len();
        state.entries.retain(|_, entry| self.is_fresh(entry, now));
        let removed = before - state.entries.len();
        if let Some(metrics) = &self.metrics {
            if removed > 0 {
                metrics
                    .cache_evictions_total
                    .with_label_values(&["expired"])
                    .inc_by(removed as f64);
            }
            metrics.cache_entries.set(state.entries.len() as f64);
        }
        removed
    }

    fn record_lookup(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_cache_lookup(outcome);
        }
    }

    fn record_eviction(&self, reason: &str, remaining: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_eviction(reason);
            metrics.cache_entries.set(remaining as f64);
        }
    }
}
