//! Shared fixtures and cross-analyzer properties.


use super::{BreakoutAnalyzer, DeepValueAnalyzer, ReversalAnalyzer, SignalAnalyzer};
use crate::domain::market::Candle;

pub(crate) fn mock_candle(
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
) -> Candle {
    Candle {
        timestamp,
        open,
        high,
        low,
        close,
        volume,
    }
}

/// `count` identical candles (open = close) with ascending timestamps from 0
pub(crate) fn flat_window(count: usize, close: f64, high: f64, low: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| mock_candle(i as i64, close, high, low, close, 100.0))
        .collect()
}

#[test]
fn test_short_windows_never_signal() {
    let analyzers: Vec<Box<dyn SignalAnalyzer>> = vec![
        Box::new(DeepValueAnalyzer::default()),
        Box::new(BreakoutAnalyzer::default()),
        Box::new(ReversalAnalyzer::default()),
    ];

    // A window that fires every analyzer once it is long enough is still
    // silent below each lookback
    let mut candles = flat_window(30, 2000.0, 2001.0, 1999.0);
    candles.push(mock_candle(30, 2000.0, 2020.0, 1999.0, 2019.0, 500.0));

    for analyzer in &analyzers {
        for len in 0..analyzer.lookback() {
            let start = candles.len() - len;
            assert!(
                analyzer.analyze(&candles[start..]).is_none(),
                "{} fired on {} candles",
                analyzer.kind(),
                len
            );
        }
    }

    assert!(analyzers[0].analyze(&candles).is_some());
    assert!(analyzers[1].analyze(&candles).is_some());
}

#[test]
fn test_empty_window_is_safe() {
    assert!(DeepValueAnalyzer::default().analyze(&[]).is_none());
    assert!(BreakoutAnalyzer::default().analyze(&[]).is_none());
    assert!(ReversalAnalyzer::default().analyze(&[]).is_none());
}
