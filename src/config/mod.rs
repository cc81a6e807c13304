//! Configuration loaded from environment variables.
//!
//! One sub-config per concern: cache, rate limiting, price source and
//! observability. Every loader also has a `from_vars` form that reads from an
//! arbitrary lookup, which is what the tests use.

mod cache_config;
mod observability_config;
mod rate_limit_config;
mod source_config;

pub use cache_config::CacheConfig;
pub use observability_config::ObservabilityEnvConfig;
pub use rate_limit_config::RateLimitConfig;
pub use source_config::SourceConfig;

use anyhow::{Context, Result, bail};
use std::env;

/// Variable lookup: returns the raw value for a key, if set.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub source: SourceConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&|key| env::var(key).ok())
    }

    pub fn from_vars(lookup: EnvLookup<'_>) -> Result<Self> {
        let cache = CacheConfig::from_vars(lookup).context("Failed to load cache config")?;
        let rate_limit =
            RateLimitConfig::from_vars(lookup).context("Failed to load rate limit config")?;
        let source = SourceConfig::from_vars(lookup);
        let observability = ObservabilityEnvConfig::from_vars(lookup)
            .context("Failed to load observability config")?;

        Ok(Self {
            cache,
            rate_limit,
            source,
            observability,
        })
    }
}

/// Parses a strictly positive integer, falling back to `default` when unset.
pub(crate) fn parse_positive_u64(lookup: EnvLookup<'_>, key: &str, default: u64) -> Result<u64> {
    let value = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .context(format!("Failed to parse {}", key))?,
        None => default,
    };
    if value == 0 {
        bail!("{} must be at least 1", key);
    }
    Ok(value)
}

pub(crate) fn parse_bool(lookup: EnvLookup<'_>, key: &str, default: bool) -> bool {
    lookup(key)
        .and_then(|raw| raw.trim().parse::<bool>().ok())
        .unwrap_or(default)
}
