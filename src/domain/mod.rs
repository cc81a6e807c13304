// Market data model: symbols and price points
pub mod market;

// Port interfaces
pub mod ports;

// Pure statistics over price series
pub mod statistics;

// Domain-specific error types
pub mod errors;
