use super::symbol::Symbol;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable, shareable view of one symbol's full price history.
pub type PriceSeries = Arc<[PricePoint]>;

/// One row of price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub symbol: Symbol,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, symbol: Symbol, price: f64) -> Self {
        Self {
            timestamp,
            symbol,
            price,
        }
    }

    /// Calendar date of the observation (UTC).
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn annotate(&self, normalized_range: f64) -> AnnotatedPricePoint {
        AnnotatedPricePoint {
            point: *self,
            normalized_range,
        }
    }
}

/// A price point stamped with its symbol's normalized range for one computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPricePoint {
    #[serde(flatten)]
    pub point: PricePoint,
    pub normalized_range: f64,
}

impl AnnotatedPricePoint {
    pub fn symbol(&self) -> Symbol {
        self.point.symbol
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.point.timestamp
    }

    pub fn price(&self) -> f64 {
        self.point.price
    }

    pub fn date(&self) -> NaiveDate {
        self.point.date()
    }
}
