// Read-through cache of per-symbol price series
pub mod price_cache;

pub use price_cache::{CacheStats, PriceCache};
