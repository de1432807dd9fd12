use crate::application::strategies::StrategyFactory;
use crate::config::{Config, Mode};
use crate::domain::market::Timeframe;
use std::collections::HashMap;
use std::time::Duration;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults_without_any_variable() {
    let config = Config::from_lookup(&lookup(&[])).unwrap();

    assert_eq!(config.mode, Mode::Mock);
    assert_eq!(config.feed.instrument, "C:XAUUSD");
    assert_eq!(config.feed.polygon_base_url.as_str(), "https://api.polygon.io/");
    assert_eq!(config.feed.http.timeout, Duration::from_secs(30));

    let distributor = &config.distributor;
    assert_eq!(distributor.instrument, "C:XAUUSD");
    assert_eq!(distributor.poll_interval, Duration::from_secs(5));
    assert_eq!(distributor.request_timeout, Duration::from_secs(10));
    assert_eq!(distributor.retry.max_attempts, 3);
    assert_eq!(distributor.retry.base_delay, Duration::from_secs(1));
    assert_eq!(distributor.retry.max_delay, Duration::from_secs(30));
    assert_eq!(distributor.live_timeframe, Timeframe::OneMin);
    assert_eq!(distributor.history_timeframe, Timeframe::FiveMin);
    assert_eq!(distributor.history_span, Duration::from_secs(24 * 3600));

    assert_eq!(config.strategy.window_capacity, 288);
    assert_eq!(config.strategy.signal_capacity, 5);
    assert_eq!(config.strategy.deep_value.lookback, 12);
    assert_eq!(config.strategy.breakout.lookback, 24);
    assert_eq!(config.strategy.reversal.lookback, 12);
}

#[test]
fn test_overrides_are_applied() {
    let config = Config::from_lookup(&lookup(&[
        ("MODE", "Polygon"),
        ("POLYGON_API_KEY", " key-123 "),
        ("INSTRUMENT", "C:XAGUSD"),
        ("POLL_INTERVAL_MS", "250"),
        ("RETRY_MAX_ATTEMPTS", "5"),
        ("HISTORY_TIMEFRAME", "15Min"),
        ("HISTORY_HOURS", "6"),
        ("BREAKOUT_MIN_STRENGTH", "0.002"),
        ("REVERSAL_ENABLED", "false"),
    ]))
    .unwrap();

    assert_eq!(config.mode, Mode::Polygon);
    assert_eq!(config.feed.polygon_api_key.as_deref(), Some("key-123"));
    assert_eq!(config.distributor.instrument, "C:XAGUSD");
    assert_eq!(config.distributor.poll_interval, Duration::from_millis(250));
    assert_eq!(config.distributor.retry.max_attempts, 5);
    assert_eq!(config.distributor.history_timeframe, Timeframe::FifteenMin);
    assert_eq!(config.distributor.history_span, Duration::from_secs(6 * 3600));
    assert!((config.strategy.breakout.min_strength - 0.002).abs() < 1e-12);
    assert!(!config.strategy.reversal_enabled);

    let engine = StrategyFactory::create_engine(&config.strategy);
    assert_eq!(engine.analyzer_count(), 2);
}

#[test]
fn test_polygon_mode_requires_api_key() {
    let err = Config::from_lookup(&lookup(&[("MODE", "polygon")])).unwrap_err();
    assert!(err.to_string().contains("POLYGON_API_KEY"));

    // Blank counts as missing
    let blank = Config::from_lookup(&lookup(&[("MODE", "polygon"), ("POLYGON_API_KEY", "  ")]));
    assert!(blank.is_err());
}

#[test]
fn test_invalid_values_name_the_variable() {
    let err = Config::from_lookup(&lookup(&[("POLL_INTERVAL_MS", "soon")])).unwrap_err();
    assert!(format!("{:#}", err).contains("POLL_INTERVAL_MS"));

    let err = Config::from_lookup(&lookup(&[("LIVE_TIMEFRAME", "7Min")])).unwrap_err();
    assert!(format!("{:#}", err).contains("LIVE_TIMEFRAME"));

    assert!(Config::from_lookup(&lookup(&[("MODE", "live")])).is_err());
    assert!(Config::from_lookup(&lookup(&[("POLL_INTERVAL_MS", "0")])).is_err());
    assert!(Config::from_lookup(&lookup(&[("RETRY_MAX_ATTEMPTS", "0")])).is_err());
    assert!(
        Config::from_lookup(&lookup(&[
            ("RETRY_BASE_DELAY_MS", "5000"),
            ("RETRY_MAX_DELAY_MS", "1000"),
        ]))
        .is_err()
    );
}

#[test]
fn test_window_must_hold_longest_lookback() {
    let err = Config::from_lookup(&lookup(&[("WINDOW_CAPACITY", "20")])).unwrap_err();
    assert!(format!("{:#}", err).contains("WINDOW_CAPACITY"));

    assert!(Config::from_lookup(&lookup(&[("REVERSAL_LOOKBACK", "2")])).is_err());
    assert!(Config::from_lookup(&lookup(&[("BREAKOUT_LOOKBACK", "1")])).is_err());
}

#[test]
fn test_feed_base_url_validation() {
    let config =
        Config::from_lookup(&lookup(&[("POLYGON_BASE_URL", "http://localhost:9000")])).unwrap();
    assert_eq!(config.feed.polygon_base_url.as_str(), "http://localhost:9000/");

    assert!(Config::from_lookup(&lookup(&[("POLYGON_BASE_URL", "not a url")])).is_err());
    assert!(Config::from_lookup(&lookup(&[("POLYGON_BASE_URL", "mailto:x@y.z")])).is_err());
}
