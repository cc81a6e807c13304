//! Line commands understood by the interactive shell, and their execution
//! against a [`StatisticsService`].

use crate::application::statistics::StatisticsService;
use crate::domain::errors::StatsError;
use crate::domain::market::Symbol;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Sorted,
    Stats(Symbol),
    Month { year: i32, month: u32 },
    Highest(NaiveDate),
    Prices(Vec<Symbol>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid argument '{value}': {reason}")]
    InvalidArgument { value: String, reason: String },
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = parts.collect();

        match (name.to_lowercase().as_str(), args.as_slice()) {
            ("sorted", []) => Ok(Command::Sorted),
            ("sorted", _) => Err(CommandError::Usage("sorted")),
            ("stats", [symbol]) => Ok(Command::Stats(parse_symbol(symbol)?)),
            ("stats", _) => Err(CommandError::Usage("stats <SYMBOL>")),
            ("month", [year, month]) => Ok(Command::Month {
                year: parse_arg(year)?,
                month: parse_arg(month)?,
            }),
            ("month", _) => Err(CommandError::Usage("month <YEAR> <MONTH>")),
            ("highest", [date]) => Ok(Command::Highest(parse_arg(date)?)),
            ("highest", _) => Err(CommandError::Usage("highest <YYYY-MM-DD>")),
            ("prices", symbols) => Ok(Command::Prices(
                symbols
                    .iter()
                    .map(|s| parse_symbol(s))
                    .collect::<Result<_, _>>()?,
            )),
            (other, _) => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_symbol(value: &str) -> Result<Symbol, CommandError> {
    parse_arg(value)
}

fn parse_arg<T>(value: &str) -> Result<T, CommandError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| CommandError::InvalidArgument {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

impl Command {
    /// Runs the command and renders its result as JSON.
    pub async fn execute(&self, service: &StatisticsService) -> Result<Value, StatsError> {
        let value = match self {
            Command::Sorted => to_json(&service.get_sorted_cryptos_by_normalized_range().await?),
            Command::Stats(symbol) => {
                let labeled: BTreeMap<String, _> = service
                    .get_statistics_for_crypto(*symbol)
                    .await?
                    .into_iter()
                    .map(|(kind, point)| (kind.label_for(*symbol), point))
                    .collect();
                to_json(&labeled)
            }
            Command::Month { year, month } => to_json(
                &service
                    .get_statistics_for_month_and_year(*year, *month)
                    .await?,
            ),
            Command::Highest(date) => to_json(&service.get_highest_normalized_range(*date).await?),
            Command::Prices(symbols) => to_json(&service.get_all_prices(symbols).await?),
        };
        Ok(value)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize command result: {}", e);
            Value::Null
        }
    }
}
