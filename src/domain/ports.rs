use crate::domain::errors::StatsError;
use crate::domain::market::{PricePoint, Symbol};
use async_trait::async_trait;
use std::time::Instant;

/// Backing store of raw price history, one full series per symbol.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Loads every row for `symbol` in source order.
    async fn load(&self, symbol: Symbol) -> Result<Vec<PricePoint>, StatsError>;
}

/// Monotonic time, injectable so expiry and refill can be driven by tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}
