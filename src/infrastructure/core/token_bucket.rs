use crate::domain::errors::StatsError;
use crate::domain::ports::Clock;
use crate::infrastructure::observability::Metrics;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Shared admission control for every boundary-facing operation.
///
/// Greedy refill: tokens accrue continuously at `refill_tokens` per
/// `refill_interval`, never above `capacity`. Every admission costs one token.
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: u64,
    refill_tokens: u64,
    refill_interval: Duration,
    clock: Arc<dyn Clock>,
    metrics: Option<Metrics>,
}

#[derive(Debug)]
struct BucketState {
    available: u64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket.
    ///
    /// # Arguments
    /// * `capacity` - Maximum tokens held (and initial fill)
    /// * `refill_tokens` - Tokens added per `refill_interval`
    /// * `refill_interval` - Period over which `refill_tokens` accrue
    /// * `clock` - Time source, injectable for tests
    pub fn new(
        capacity: u64,
        refill_tokens: u64,
        refill_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.now();
        Self {
            state: Mutex::new(BucketState {
                available: capacity,
                last_refill: now,
            }),
            capacity,
            refill_tokens,
            refill_interval,
            clock,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Consume one token if available. Never blocks.
    pub fn try_admit(&self) -> bool {
        let mut state = self.lock_state();
        self.refill(&mut state);

        let admitted = state.available > 0;
        if admitted {
            state.available -= 1;
        }
        let remaining = state.available;
        drop(state);

        if let Some(metrics) = &self.metrics {
            metrics.inc_admission(if admitted { "admitted" } else { "rejected" });
            metrics.available_tokens.set(remaining as f64);
        }

        if admitted {
            debug!("TokenBucket: admitted ({} tokens left)", remaining);
        } else {
            warn!(
                "TokenBucket: request rejected (capacity {} per {:?})",
                self.capacity, self.refill_interval
            );
        }

        admitted
    }

    /// Like `try_admit`, but yields the error callers surface on rejection.
    pub fn admit(&self) -> Result<(), StatsError> {
        if self.try_admit() {
            Ok(())
        } else {
            Err(self.rejection())
        }
    }

    /// Tokens currently available, after applying any pending refill.
    pub fn available_tokens(&self) -> u64 {
        let mut state = self.lock_state();
        self.refill(&mut state);
        state.available
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }

    pub fn rejection(&self) -> StatsError {
        StatsError::RateLimited {
            capacity: self.capacity,
            interval_secs: self.refill_interval.as_secs(),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, BucketState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn refill(&self, state: &mut BucketState) {
        let now = self.clock.now();
        // Time spent at capacity earns nothing.
        if state.available >= self.capacity {
            state.last_refill = now;
            return;
        }

        let elapsed = now.saturating_duration_since(state.last_refill).as_nanos();
        let interval = self.refill_interval.as_nanos().max(1);
        let per_interval = u128::from(self.refill_tokens);
        if per_interval == 0 {
            return;
        }

        let tokens = elapsed * per_interval / interval;
        if tokens == 0 {
            return;
        }

        let missing = u128::from(self.capacity - state.available.min(self.capacity));
        if tokens >= missing {
            state.available = self.capacity;
            state.last_refill = now;
        } else {
            state.available += tokens as u64;
            // Only advance by the time those tokens account for, keeping the remainder.
            let consumed = (tokens * interval).div_ceil(per_interval);
            state.last_refill += Duration::from_nanos(consumed.min(u128::from(u64::MAX)) as u64);
        }
    }
}

impl std::fmt::Debug for TokenBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucket")
            .field("capacity", &self.capacity)
            .field("refill_tokens", &self.refill_tokens)
            .field("refill_interval", &self.refill_interval)
            .finish_non_exhaustive()
    }
}
