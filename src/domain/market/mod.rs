pub mod price_point;
pub mod symbol;

pub use price_point::{AnnotatedPricePoint, PricePoint, PriceSeries};
pub use symbol::{Symbol, UnknownSymbol};
