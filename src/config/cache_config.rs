use super::{EnvLookup, parse_positive_u64};
use anyhow::Result;
use std::time::Duration;

/// Read-through cache sizing and expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl_minutes: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 10,
            max_entries: 10,
        }
    }
}

impl CacheConfig {
    pub fn from_vars(lookup: EnvLookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            ttl_minutes: parse_positive_u64(lookup, "CACHE_TTL_MINUTES", defaults.ttl_minutes)?,
            max_entries: parse_positive_u64(
                lookup,
                "CACHE_MAX_ENTRIES",
                defaults.max_entries as u64,
            )? as usize,
        })
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }
}
