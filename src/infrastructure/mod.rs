pub mod core;
pub mod csv_price_source;
pub mod mock;
pub mod observability;

pub use csv_price_source::CsvPriceSource;
pub use observability::{Metrics, MetricsReporter};
