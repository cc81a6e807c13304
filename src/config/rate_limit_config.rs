use super::{EnvLookup, parse_positive_u64};
use anyhow::Result;
use std::time::Duration;

/// Shared token bucket parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub capacity: u64,
    pub refill_tokens: u64,
    pub refill_interval_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            refill_tokens: 10,
            refill_interval_seconds: 60,
        }
    }
}

impl RateLimitConfig {
    pub fn from_vars(lookup: EnvLookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            capacity: parse_positive_u64(lookup, "RATE_LIMIT_CAPACITY", defaults.capacity)?,
            refill_tokens: parse_positive_u64(
                lookup,
                "RATE_LIMIT_REFILL_TOKENS",
                defaults.refill_tokens,
            )?,
            refill_interval_seconds: parse_positive_u64(
                lookup,
                "RATE_LIMIT_REFILL_INTERVAL_SECONDS",
                defaults.refill_interval_seconds,
            )?,
        })
    }

    pub fn refill_interval(&self) -> Duration {
        Duration::from_secs(self.refill_interval_seconds)
    }
}
