//! Observability configuration parsing from environment variables.

use super::{EnvLookup, parse_bool, parse_positive_u64};
use anyhow::Result;

/// Periodic metrics snapshot settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityEnvConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 60,
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_vars(lookup: EnvLookup<'_>) -> Result<Self> {
        Ok(Self {
            enabled: parse_bool(lookup, "OBSERVABILITY_ENABLED", true),
            interval_seconds: parse_positive_u64(lookup, "OBSERVABILITY_INTERVAL", 60)?,
        })
    }
}
