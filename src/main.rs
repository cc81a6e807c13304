//! cryptostats - price statistics over per-symbol CSV history
//!
//! # Usage
//! ```sh
//! cryptostats sorted
//! cryptostats stats BTC
//! cryptostats month 2022 1
//! cryptostats highest 2022-01-05
//! cryptostats prices ETH XRP
//! cryptostats shell < commands.txt
//! cryptostats burst --requests 25
//! ```
//!
//! Results are written to stdout as JSON; logs go to stderr.
//! Configuration comes from the environment (or a `.env` file), see `config`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cryptostats::application::system::Application;
use cryptostats::config::Config;
use cryptostats::domain::market::Symbol;
use cryptostats::interfaces::{Command, CommandError, ErrorResponse};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the <SYMBOL>_values.csv files (overrides PRICES_DIR)
    #[arg(long, global = true)]
    prices_dir: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// All prices of all symbols, sorted by normalized range (descending)
    Sorted,
    /// Oldest, newest, min and max price of one symbol
    Stats { symbol: Symbol },
    /// Per-symbol extrema within one calendar month
    Month { year: i32, month: u32 },
    /// The symbol with the highest normalized range on a day (YYYY-MM-DD)
    Highest { date: NaiveDate },
    /// Raw prices of the given symbols (all when none given)
    Prices { symbols: Vec<Symbol> },
    /// Read commands from stdin, one per line, against one long-lived service
    Shell,
    /// Fire concurrent `sorted` calls and report how admission went
    Burst {
        #[arg(long, default_value_t = 20)]
        requests: usize,
    },
}

#[derive(Serialize)]
struct BurstReport {
    requests: usize,
    admitted: usize,
    rate_limited: usize,
    failed: usize,
    source_loads: u64,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let args = Args::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(dir) = args.prices_dir.clone() {
        config.source.prices_dir = dir;
    }
    info!("cryptostats {} starting", env!("CARGO_PKG_VERSION"));

    let app = Application::build(config).context("Failed to build application")?;

    let command = match args.command {
        Cmd::Sorted => Command::Sorted,
        Cmd::Stats { symbol } => Command::Stats(symbol),
        Cmd::Month { year, month } => Command::Month { year, month },
        Cmd::Highest { date } => Command::Highest(date),
        Cmd::Prices { symbols } => Command::Prices(symbols),
        Cmd::Shell => {
            run_shell(&app, args.pretty).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Cmd::Burst { requests } => {
            let report = run_burst(&app, requests).await;
            print_json(&report, args.pretty);
            return Ok(ExitCode::SUCCESS);
        }
    };

    match command.execute(&app.service).await {
        Ok(value) => {
            print_json(&value, args.pretty);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let response = ErrorResponse::from(&e);
            print_json(&response, args.pretty);
            Ok(ExitCode::from(response.exit_code() as u8))
        }
    }
}

async fn run_shell(app: &Application, pretty: bool) -> Result<()> {
    let _tasks = app.start();
    info!("Shell ready: sorted | stats <SYMBOL> | month <YEAR> <MONTH> | highest <DATE> | prices [SYMBOL...] | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }

        match line.parse::<Command>() {
            Ok(command) => match command.execute(&app.service).await {
                Ok(value) => print_json(&value, pretty),
                Err(e) => print_json(&ErrorResponse::from(&e), pretty),
            },
            Err(e @ CommandError::Empty) => warn!("Ignoring input: {}", e),
            Err(e) => print_json(&ErrorResponse::from(&e), pretty),
        }
    }

    info!("Shell closed");
    Ok(())
}

async fn run_burst(app: &Application, requests: usize) -> BurstReport {
    let tasks: Vec<_> = (0..requests)
        .map(|_| {
            let service = app.service.clone();
            tokio::spawn(async move { service.get_sorted_cryptos_by_normalized_range().await })
        })
        .collect();

    let mut report = BurstReport {
        requests,
        admitted: 0,
        rate_limited: 0,
        failed: 0,
        source_loads: 0,
    };
    for result in futures::future::join_all(tasks).await {
        match result {
            Ok(Ok(_)) => report.admitted += 1,
            Ok(Err(e)) if e.is_rate_limited() => report.rate_limited += 1,
            Ok(Err(e)) => {
                report.admitted += 1;
                report.failed += 1;
                warn!("Burst request failed: {}", e);
            }
            Err(e) => {
                report.failed += 1;
                warn!("Burst task panicked: {}", e);
            }
        }
    }
    report.source_loads = Symbol::ALL
        .iter()
        .flat_map(|s| ["ok", "error"].map(|r| app.metrics.source_loads(s.as_str(), r)))
        .sum();

    info!(
        "Burst done: {} admitted, {} rate limited, {} source loads",
        report.admitted, report.rate_limited, report.source_loads
    );
    report
}

fn print_json<T: Serialize>(value: &T, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Failed to serialize output: {}", e),
    }
}
