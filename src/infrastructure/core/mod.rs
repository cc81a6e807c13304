pub mod clock;
pub mod token_bucket;

pub use clock::SystemClock;
pub use token_bucket::TokenBucket;
