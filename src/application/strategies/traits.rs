use crate::domain::market::Candle;
use crate::domain::trading::{Signal, StrategyKind};

/// A stateless pattern detector over a time-ascending candle window.
///
/// Implementations hold tuning parameters only. `analyze` must be pure: the
/// same window always yields the same result, and a window shorter than
/// `lookback()` yields `None`.
pub trait SignalAnalyzer: Send + Sync {
    fn analyze(&self, candles: &[Candle]) -> Option<Signal>;

    /// Number of most recent candles this analyzer needs
    fn lookback(&self) -> usize;

    fn kind(&self) -> StrategyKind;
}

/// The trailing `lookback` candles, or `None` when the window is too short.
pub(crate) fn tail(candles: &[Candle], lookback: usize) -> Option<&[Candle]> {
    if lookback == 0 || candles.len() < lookback {
        return None;
    }
    Some(&candles[candles.len() - lookback..])
}

pub(crate) fn highest_high(candles: &[Candle]) -> Option<f64> {
    candles.iter().map(|c| c.high).reduce(f64::max)
}

pub(crate) fn lowest_low(candles: &[Candle]) -> Option<f64> {
    candles.iter().map(|c| c.low).reduce(f64::min)
}
