use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Tradeable assets with a price history source.
///
/// Declaration order is the canonical iteration order used wherever results
/// are concatenated across symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Symbol {
    Btc,
    Doge,
    Eth,
    Ltc,
    Xrp,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown symbol: {0}")]
pub struct UnknownSymbol(pub String);

impl Symbol {
    pub const ALL: [Symbol; 5] = [
        Symbol::Btc,
        Symbol::Doge,
        Symbol::Eth,
        Symbol::Ltc,
        Symbol::Xrp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::Btc => "BTC",
            Symbol::Doge => "DOGE",
            Symbol::Eth => "ETH",
            Symbol::Ltc => "LTC",
            Symbol::Xrp => "XRP",
        }
    }

    /// Name of the flat file holding this symbol's history.
    pub fn file_name(&self) -> String {
        format!("{}_values.csv", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = UnknownSymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BTC" => Ok(Symbol::Btc),
            "DOGE" => Ok(Symbol::Doge),
            "ETH" => Ok(Symbol::Eth),
            "LTC" => Ok(Symbol::Ltc),
            "XRP" => Ok(Symbol::Xrp),
            _ => Err(UnknownSymbol(s.to_string())),
        }
    }
}
