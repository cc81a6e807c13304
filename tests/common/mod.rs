#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Temp directory of CSV fixtures, removed on drop.
pub struct PricesDir {
    path: PathBuf,
}

impl PricesDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("cryptostats-it-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).expect("create fixture dir");
        Self { path }
    }

    /// Writes `<symbol>_values.csv` with a header and `(millis, price)` rows.
    pub fn write(&self, symbol: &str, rows: &[(i64, f64)]) -> &Self {
        let mut body = String::from("timestamp,symbol,price\n");
        for (millis, price) in rows {
            body.push_str(&format!("{},{},{}\n", millis, symbol, price));
        }
        self.write_raw(symbol, &body)
    }

    pub fn write_raw(&self, symbol: &str, body: &str) -> &Self {
        std::fs::write(self.path.join(format!("{}_values.csv", symbol)), body)
            .expect("write fixture");
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PricesDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.path).ok();
    }
}

// 2022-01-01 04:00, 2022-01-02 04:00, 2022-01-03 04:00 UTC
pub const T1: i64 = 1_641_009_600_000;
pub const T2: i64 = 1_641_096_000_000;
pub const T3: i64 = 1_641_182_400_000;
// 2022-02-10 12:00 UTC
pub const FEB_10: i64 = 1_644_494_400_000;

/// BTC and ETH with the reference prices, other symbols present but empty.
pub fn reference_prices() -> PricesDir {
    let dir = PricesDir::new();
    dir.write("BTC", &[(T1, 2000.0), (T2, 2500.0), (T3, 1800.0)])
        .write("ETH", &[(T1, 4000.0), (T2, 4200.0)])
        .write("DOGE", &[])
        .write("LTC", &[(FEB_10, 150.0)])
        .write("XRP", &[]);
    dir
}
