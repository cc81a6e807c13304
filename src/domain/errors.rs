use crate::domain::market::Symbol;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced by the statistics core.
///
/// `Clone` so that one failed load can be handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("Failed to parse {symbol} price data at line {line}: {reason}")]
    Parse {
        symbol: Symbol,
        line: u64,
        reason: String,
    },

    #[error("Price source for {symbol} is unavailable: {reason}")]
    SourceUnavailable { symbol: Symbol, reason: String },

    #[error("Invalid year or month: year={year}, month={month}")]
    InvalidDate { year: i32, month: u32 },

    #[error("No price data found for date {date}")]
    DateNotFound { date: NaiveDate },

    #[error("Cannot compute statistics for {symbol}: {reason}")]
    Domain { symbol: Symbol, reason: String },

    #[error("Too many requests. Maximum is {capacity} per {interval_secs} seconds")]
    RateLimited { capacity: u64, interval_secs: u64 },
}

impl StatsError {
    /// Stable machine-readable code for the boundary layer.
    pub fn code(&self) -> &'static str {
        match self {
            StatsError::Parse { .. } => "PARSE_ERROR",
            StatsError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            StatsError::InvalidDate { .. } => "INVALID_DATE",
            StatsError::DateNotFound { .. } => "DATE_ERROR",
            StatsError::Domain { .. } => "DOMAIN_ERROR",
            StatsError::RateLimited { .. } => "RATE_LIMITED",
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, StatsError::RateLimited { .. })
    }

    /// Errors caused by the request itself rather than the data behind it.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            StatsError::InvalidDate { .. } | StatsError::DateNotFound { .. }
        )
    }
}
