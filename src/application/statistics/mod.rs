// Aggregates over cached price series
pub mod engine;

// Rate-limited boundary operations
pub mod service;

pub use engine::{MonthStatistics, StatisticsEngine, SymbolStatistics};
pub use service::StatisticsService;
