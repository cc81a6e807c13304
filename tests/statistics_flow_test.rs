mod common;

use chrono::NaiveDate;
use common::{PricesDir, reference_prices};
use cryptostats::application::system::Application;
use cryptostats::config::Config;
use cryptostats::domain::errors::StatsError;
use cryptostats::domain::market::Symbol;
use cryptostats::domain::statistics::StatisticKind;
use tokio_test::{assert_err, assert_ok};

fn app_over(dir: &PricesDir) -> Application {
    let mut config = Config::default();
    config.source.prices_dir = dir.path().to_path_buf();
    config.rate_limit.capacity = 100;
    Application::build(config).expect("build application")
}

/// BTC (range ~0.3889) must rank ahead of ETH (range 0.05) across the board
#[tokio::test]
async fn test_sorted_ranking_from_csv() {
    let dir = reference_prices();
    let app = app_over(&dir);

    let sorted = assert_ok!(app.service.get_sorted_cryptos_by_normalized_range().await);

    assert_eq!(sorted.len(), 6);
    assert_eq!(sorted[0].symbol(), Symbol::Btc);
    assert!((sorted[0].normalized_range - 700.0 / 1800.0).abs() < 1e-12);
    let first_eth = sorted
        .iter()
        .position(|p| p.symbol() == Symbol::Eth)
        .unwrap();
    assert!(sorted[..first_eth].iter().all(|p| p.symbol() != Symbol::Eth));
    assert!((sorted[first_eth].normalized_range - 0.05).abs() < 1e-12);
    assert!(
        sorted
            .windows(2)
            .all(|w| w[0].normalized_range >= w[1].normalized_range)
    );
    // LTC has a single price, so its range is zero and it sorts last
    assert_eq!(sorted[5].symbol(), Symbol::Ltc);
    assert_eq!(sorted[5].normalized_range, 0.0);
}

#[tokio::test]
async fn test_symbol_statistics_from_csv() {
    let dir = reference_prices();
    let app = app_over(&dir);

    let stats = assert_ok!(app.service.get_statistics_for_crypto(Symbol::Eth).await);
    assert_eq!(stats[&StatisticKind::Oldest].price(), 4000.0);
    assert_eq!(stats[&StatisticKind::Newest].price(), 4200.0);
    assert_eq!(stats[&StatisticKind::Min].price(), 4000.0);
    assert_eq!(stats[&StatisticKind::Max].price(), 4200.0);

    let err = assert_err!(app.service.get_statistics_for_crypto(Symbol::Doge).await);
    assert_eq!(err.code(), "DOMAIN_ERROR");
}

#[tokio::test]
async fn test_month_statistics_from_csv() {
    let dir = reference_prices();
    let app = app_over(&dir);

    let january = assert_ok!(app.service.get_statistics_for_month_and_year(2022, 1).await);
    let symbols: Vec<_> = january[&StatisticKind::Min]
        .iter()
        .map(|p| p.symbol())
        .collect();
    assert_eq!(symbols, vec![Symbol::Btc, Symbol::Eth]);
    assert_eq!(january[&StatisticKind::Min][0].price(), 1800.0);

    let february = assert_ok!(app.service.get_statistics_for_month_and_year(2022, 2).await);
    assert_eq!(february[&StatisticKind::Max].len(), 1);
    assert_eq!(february[&StatisticKind::Max][0].symbol(), Symbol::Ltc);
}

#[tokio::test]
async fn test_invalid_month_never_touches_the_cache() {
    let dir = reference_prices();
    let app = app_over(&dir);

    for (year, month) in [(2022, 13), (2022, 0), (-1, 6)] {
        let err = assert_err!(
            app.service
                .get_statistics_for_month_and_year(year, month)
                .await
        );
        assert!(matches!(err, StatsError::InvalidDate { .. }));
    }
    assert!(app.cache.is_empty());
    assert_eq!(app.metrics.cache_lookups("miss"), 0);
}

#[tokio::test]
async fn test_highest_normalized_range_by_date() {
    let dir = reference_prices();
    let app = app_over(&dir);

    let date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    let best = assert_ok!(app.service.get_highest_normalized_range(date).await);
    assert_eq!(best.symbol(), Symbol::Btc);
    assert_eq!(best.price(), 2000.0);

    let empty_day = NaiveDate::from_ymd_opt(2022, 1, 20).unwrap();
    let err = assert_err!(app.service.get_highest_normalized_range(empty_day).await);
    assert_eq!(err.code(), "DATE_ERROR");
}

#[tokio::test]
async fn test_all_prices_follow_requested_order() {
    let dir = reference_prices();
    let app = app_over(&dir);

    let prices = assert_ok!(
        app.service
            .get_all_prices(&[Symbol::Ltc, Symbol::Eth])
            .await
    );
    let pairs: Vec<_> = prices.iter().map(|p| (p.symbol, p.price)).collect();
    assert_eq!(
        pairs,
        vec![(Symbol::Ltc, 150.0), (Symbol::Eth, 4000.0), (Symbol::Eth, 4200.0)]
    );
}

#[tokio::test]
async fn test_malformed_file_is_reported_and_not_cached() {
    let dir = reference_prices();
    dir.write_raw("XRP", "timestamp,symbol,price\n1641009600000,XRP,0.83\n1641020400000,XRP,n/a\n");
    let app = app_over(&dir);

    let err = assert_err!(app.service.get_statistics_for_crypto(Symbol::Xrp).await);
    assert!(matches!(err, StatsError::Parse { line: 3, .. }));
    assert!(!app.cache.contains(Symbol::Xrp));

    // Fixing the file is picked up by the next call
    dir.write("XRP", &[(common::T1, 0.83), (common::T2, 0.85)]);
    let stats = assert_ok!(app.service.get_statistics_for_crypto(Symbol::Xrp).await);
    assert_eq!(stats[&StatisticKind::Max].price(), 0.85);
}

#[tokio::test]
async fn test_missing_file_is_source_unavailable() {
    let dir = PricesDir::new();
    dir.write("BTC", &[(common::T1, 46813.21)]);
    let app = app_over(&dir);

    let err = assert_err!(app.service.get_statistics_for_crypto(Symbol::Ltc).await);
    assert_eq!(err.code(), "SOURCE_UNAVAILABLE");
    assert_ok!(app.service.get_statistics_for_crypto(Symbol::Btc).await);
}
