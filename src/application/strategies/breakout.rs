use super::traits::{SignalAnalyzer, highest_high, tail};
use crate::domain::market::Candle;
use crate::domain::trading::{Signal, StrategyKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutConfig {
    /// Total candles inspected, current one included
    pub lookback: usize,
    /// Minimum (close - recent high) / recent high
    pub min_strength: f64,
    pub tp2_multiple: f64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            lookback: 24,        // 2 hours of 5-min candles
            min_strength: 0.001, // 0.1%
            tp2_multiple: 2.0,
        }
    }
}

/// Monthly Income (Breakout) Strategy
///
/// Detects a close above resistance with confirmation:
/// - Resistance = highest high of the candles before the current one
/// - Current candle must be bullish
/// - Current volume must exceed the previous candle's volume
#[derive(Debug, Clone, Default)]
pub struct BreakoutAnalyzer {
    config: BreakoutConfig,
}

impl BreakoutAnalyzer {
    pub fn new(config: BreakoutConfig) -> Self {
        Self { config }
    }
}

impl SignalAnalyzer for BreakoutAnalyzer {
    fn analyze(&self, candles: &[Candle]) -> Option<Signal> {
        if self.config.lookback < 2 {
            return None;
        }
        let window = tail(candles, self.config.lookback)?;
        let (current, reference) = window.split_last()?;
        let previous = reference.last()?;
        let recent_high = highest_high(reference)?;

        if recent_high <= 0.0 {
            return None;
        }

        let breakout_strength = (current.close - recent_high) / recent_high;
        let is_strong_breakout = breakout_strength > self.config.min_strength
            && current.is_bullish()
            && current.volume > previous.volume;

        if !is_strong_breakout {
            return None;
        }

        let stop_loss = current.low.min(recent_high);

        Some(Signal::long_entry(
            StrategyKind::MonthlyIncome,
            current.close,
            stop_loss,
            self.config.tp2_multiple,
            current.timestamp,
            format!(
                "Strong breakout with volume confirmation: close {:.2} > high {:.2} (+{:.2}%), volume {:.0} > {:.0}",
                current.close,
                recent_high,
                breakout_strength * 100.0,
                current.volume,
                previous.volume
            ),
        ))
    }

    fn lookback(&self) -> usize {
        self.config.lookback
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::MonthlyIncome
    }
}
