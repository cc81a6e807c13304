// Read-through price cache
pub mod market_data;

// Statistics engine and rate-limited service
pub mod statistics;

// Application assembly
pub mod system;
