use super::traits::{SignalAnalyzer, lowest_low, tail};
use crate::domain::market::Candle;
use crate::domain::trading::{Signal, StrategyKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeepValueConfig {
    pub lookback: usize,
    /// Minimum (high - recent low) / high
    pub min_drop_pct: f64,
    /// Minimum share of the current range recovered by the close
    pub min_recovery: f64,
    pub tp2_multiple: f64,
}

impl Default for DeepValueConfig {
    fn default() -> Self {
        Self {
            lookback: 12,       // 1 hour of 5-min candles
            min_drop_pct: 0.005, // 0.5%
            min_recovery: 0.7,
            tp2_multiple: 1.5,
        }
    }
}

/// Deep Value Strategy
///
/// Buys after a significant drop when the current candle closes near its high:
/// - Recent low = lowest low of the lookback window (current candle included)
/// - Drop = distance from the current high down to that low
/// - Recovery = fraction of the current candle's range recovered by the close
///
/// Stop goes under the recent low (rounded down to the cent), targets at 1R
/// and `tp2_multiple` R.
#[derive(Debug, Clone, Default)]
pub struct DeepValueAnalyzer {
    config: DeepValueConfig,
}

impl DeepValueAnalyzer {
    pub fn new(config: DeepValueConfig) -> Self {
        Self { config }
    }
}

/// (close - low) / (high - low); zero for a zero-range candle
pub fn recovery_strength(candle: &Candle) -> f64 {
    let range = candle.range();
    if range <= 0.0 {
        return 0.0;
    }
    (candle.close - candle.low) / range
}

impl SignalAnalyzer for DeepValueAnalyzer {
    fn analyze(&self, candles: &[Candle]) -> Option<Signal> {
        let window = tail(candles, self.config.lookback)?;
        let current = window.last()?;
        let recent_low = lowest_low(window)?;

        if current.high <= 0.0 {
            return None;
        }

        let drop = (current.high - recent_low) / current.high;
        let recovery = recovery_strength(current);

        if drop <= self.config.min_drop_pct || recovery <= self.config.min_recovery {
            return None;
        }

        let stop_loss = (recent_low * 100.0).floor() / 100.0;

        Some(Signal::long_entry(
            StrategyKind::DeepValue,
            current.close,
            stop_loss,
            self.config.tp2_multiple,
            current.timestamp,
            format!(
                "Significant drop with strong recovery candle (drop {:.2}%, recovery {:.0}%)",
                drop * 100.0,
                recovery * 100.0
            ),
        ))
    }

    fn lookback(&self) -> usize {
        self.config.lookback
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::DeepValue
    }
}
