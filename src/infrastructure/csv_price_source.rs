//! Flat-file price history: one `<SYMBOL>_values.csv` per symbol.
//!
//! Layout is a header row followed by `timestamp,symbol,price` rows where the
//! timestamp is epoch milliseconds. The symbol column must equal the file's
//! upper-case ticker exactly.

use crate::domain::errors::StatsError;
use crate::domain::market::{PricePoint, Symbol};
use crate::domain::ports::PriceSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, symbol: Symbol) -> PathBuf {
        self.dir.join(symbol.file_name())
    }
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    async fn load(&self, symbol: Symbol) -> Result<Vec<PricePoint>, StatsError> {
        let path = self.path_for(symbol);
        debug!("CsvPriceSource: reading {}", path.display());

        let points = tokio::task::spawn_blocking(move || read_file(symbol, &path))
            .await
            .map_err(|e| StatsError::SourceUnavailable {
                symbol,
                reason: format!("reader task failed: {}", e),
            })??;

        info!("CsvPriceSource: loaded {} rows for {}", points.len(), symbol);
        Ok(points)
    }
}

fn read_file(symbol: Symbol, path: &Path) -> Result<Vec<PricePoint>, StatsError> {
    let file = std::fs::File::open(path).map_err(|e| StatsError::SourceUnavailable {
        symbol,
        reason: format!("{}: {}", path.display(), e),
    })?;
    read_prices(symbol, file)
}

/// Parses CSV rows from any reader. The first row is a header.
pub fn read_prices<R: std::io::Read>(symbol: Symbol, reader: R) -> Result<Vec<PricePoint>, StatsError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut points = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| csv_error(symbol, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let parse_err = |reason: String| StatsError::Parse {
            symbol,
            line,
            reason,
        };

        if record.len() != 3 {
            return Err(parse_err(format!("expected 3 columns, found {}", record.len())));
        }

        let millis: i64 = record[0]
            .parse()
            .map_err(|_| parse_err(format!("invalid timestamp '{}'", &record[0])))?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| parse_err(format!("timestamp {} out of range", millis)))?;

        if &record[1] != symbol.as_str() {
            return Err(parse_err(format!(
                "row symbol '{}' does not match {}",
                &record[1], symbol
            )));
        }

        let price: f64 = record[2]
            .parse()
            .map_err(|_| parse_err(format!("invalid price '{}'", &record[2])))?;
        if !price.is_finite() || price <= 0.0 {
            return Err(parse_err(format!("price {} is not positive", price)));
        }

        points.push(PricePoint::new(timestamp, symbol, price));
    }

    Ok(points)
}

fn csv_error(symbol: Symbol, err: csv::Error) -> StatsError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    if let csv::ErrorKind::Io(io) = err.kind() {
        return StatsError::SourceUnavailable {
            symbol,
            reason: io.to_string(),
        };
    }
    StatsError::Parse {
        symbol,
        line,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BTC_ROWS: &str = "timestamp,symbol,price\n\
        1641009600000,BTC,46813.21\n\
        1641020400000,BTC,46979.61\n\
        1641031200000,BTC,47143.98\n";

    #[test]
    fn test_reads_rows_in_file_order() {
        let points = read_prices(Symbol::Btc, BTC_ROWS.as_bytes()).unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(
            points[0].timestamp,
            Utc.with_ymd_and_hms(2022, 1, 1, 4, 0, 0).unwrap()
        );
        assert_eq!(points[0].price, 46813.21);
        assert_eq!(points[2].price, 47143.98);
        assert!(points.iter().all(|p| p.symbol == Symbol::Btc));
    }

    #[test]
    fn test_trims_whitespace() {
        let data = "timestamp, symbol, price\n 1641009600000, BTC,  46813.21\n";
        let points = read_prices(Symbol::Btc, data.as_bytes()).unwrap();
        assert_eq!(points[0].price, 46813.21);
    }

    #[test]
    fn test_header_only_is_empty() {
        let points = read_prices(Symbol::Eth, "timestamp,symbol,price\n".as_bytes()).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_rejects_bad_price_with_line() {
        let data = "timestamp,symbol,price\n1641009600000,BTC,46813.21\n1641020400000,BTC,abc\n";
        let err = read_prices(Symbol::Btc, data.as_bytes()).unwrap_err();
        match err {
            StatsError::Parse { line, reason, .. } => {
                assert_eq!(line, 3);
                assert!(reason.contains("abc"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let data = "timestamp,symbol,price\n1641009600000,BTC,0\n";
        assert!(matches!(
            read_prices(Symbol::Btc, data.as_bytes()),
            Err(StatsError::Parse { .. })
        ));
        let data = "timestamp,symbol,price\n1641009600000,BTC,-3.5\n";
        assert!(read_prices(Symbol::Btc, data.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_wrong_column_count() {
        let data = "timestamp,symbol,price\n1641009600000,BTC\n";
        let err = read_prices(Symbol::Btc, data.as_bytes()).unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[test]
    fn test_rejects_malformed_timestamp() {
        let data = "timestamp,symbol,price\n2022-01-01,BTC,46813.21\n";
        assert!(matches!(
            read_prices(Symbol::Btc, data.as_bytes()),
            Err(StatsError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_rejects_symbol_mismatch() {
        let data = "timestamp,symbol,price\n1641009600000,ETH,3715.32\n";
        let err = read_prices(Symbol::Btc, data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_rejects_lowercase_row_symbol() {
        let data = "timestamp,symbol,price\n1641009600000,btc,46813.21\n";
        let err = read_prices(Symbol::Btc, data.as_bytes()).unwrap_err();
        assert!(matches!(err, StatsError::Parse { line: 2, .. }));
        assert!(err.to_string().contains("'btc' does not match"));
    }

    #[tokio::test]
    async fn test_load_from_directory() {
        let dir = std::env::temp_dir().join(format!("cryptostats-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("BTC_values.csv"), BTC_ROWS).unwrap();

        let source = CsvPriceSource::new(&dir);
        let points = source.load(Symbol::Btc).await.unwrap();
        assert_eq!(points.len(), 3);

        let missing = source.load(Symbol::Doge).await.unwrap_err();
        assert!(matches!(
            missing,
            StatsError::SourceUnavailable { symbol: Symbol::Doge, .. }
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
