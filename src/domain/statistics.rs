//! Pure calculations over price series.
//!
//! Nothing here touches the cache or the source; the engine feeds series in
//! and wraps the results.

use crate::domain::errors::StatsError;
use crate::domain::market::{PricePoint, Symbol};
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four extrema reported for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticKind {
    Oldest,
    Newest,
    Min,
    Max,
}

impl StatisticKind {
    pub const ALL: [StatisticKind; 4] = [
        StatisticKind::Oldest,
        StatisticKind::Newest,
        StatisticKind::Min,
        StatisticKind::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticKind::Oldest => "oldest",
            StatisticKind::Newest => "newest",
            StatisticKind::Min => "min",
            StatisticKind::Max => "max",
        }
    }

    /// Per-symbol label, e.g. `BTC-oldest`.
    pub fn label_for(&self, symbol: Symbol) -> String {
        format!("{}-{}", symbol, self.as_str())
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extrema of a non-empty series, borrowed from it.
#[derive(Debug, Clone, Copy)]
pub struct Extrema<'a> {
    pub oldest: &'a PricePoint,
    pub newest: &'a PricePoint,
    pub min: &'a PricePoint,
    pub max: &'a PricePoint,
}

impl<'a> Extrema<'a> {
    pub fn get(&self, kind: StatisticKind) -> &'a PricePoint {
        match kind {
            StatisticKind::Oldest => self.oldest,
            StatisticKind::Newest => self.newest,
            StatisticKind::Min => self.min,
            StatisticKind::Max => self.max,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatisticKind, &'a PricePoint)> + use<'a> {
        let extrema = *self;
        StatisticKind::ALL
            .into_iter()
            .map(move |kind| (kind, extrema.get(kind)))
    }
}

/// Finds all four extrema in one pass.
///
/// Comparisons are strict, so on ties the first point in iteration order wins.
/// Returns `None` for an empty input.
pub fn extrema<'a, I>(points: I) -> Option<Extrema<'a>>
where
    I: IntoIterator<Item = &'a PricePoint>,
{
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let mut acc = Extrema {
        oldest: first,
        newest: first,
        min: first,
        max: first,
    };

    for point in iter {
        if point.timestamp < acc.oldest.timestamp {
            acc.oldest = point;
        }
        if point.timestamp > acc.newest.timestamp {
            acc.newest = point;
        }
        if point.price < acc.min.price {
            acc.min = point;
        }
        if point.price > acc.max.price {
            acc.max = point;
        }
    }

    Some(acc)
}

/// `(max - min) / min` over the whole series.
pub fn normalized_range(symbol: Symbol, points: &[PricePoint]) -> Result<f64, StatsError> {
    let (min, max) = points
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, p| match acc {
            None => Some((p.price, p.price)),
            Some((lo, hi)) => Some((lo.min(p.price), hi.max(p.price))),
        })
        .ok_or_else(|| StatsError::Domain {
            symbol,
            reason: "no price points loaded".to_string(),
        })?;

    if min.is_nan() || min <= 0.0 {
        return Err(StatsError::Domain {
            symbol,
            reason: format!("minimum price {} is not positive", min),
        });
    }

    let range = (max - min) / min;
    if !range.is_finite() {
        return Err(StatsError::Domain {
            symbol,
            reason: format!("normalized range is not finite (min={}, max={})", min, max),
        });
    }

    Ok(range)
}

/// Inclusive UTC span of a calendar month: first instant to one nanosecond
/// before the first instant of the following month.
pub fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), StatsError> {
    let invalid = || StatsError::InvalidDate { year, month };

    if year < 0 || !(1..=12).contains(&month) {
        return Err(invalid());
    }

    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(invalid)?
        .and_utc();
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or_else(invalid)?
        - Duration::nanoseconds(1);

    Ok((start, end))
}
