use super::traits::{SignalAnalyzer, highest_high, tail};
use crate::domain::market::Candle;
use crate::domain::trading::{Signal, StrategyKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReversalConfig {
    /// Total candles inspected, current one included
    pub lookback: usize,
    /// Minimum (preceding high - close) / preceding high
    pub min_strength: f64,
    pub tp2_multiple: f64,
}

impl Default for ReversalConfig {
    fn default() -> Self {
        Self {
            lookback: 12,        // 1 hour of 5-min candles
            min_strength: 0.001, // 0.1%
            tp2_multiple: 2.0,
        }
    }
}

/// Reversal (failed breakout) Strategy
///
/// Fades a breakout that did not hold:
/// - The preceding candle pushed above the swing high of the candles before it
/// - The current candle closes below the preceding candle's low
///
/// Short bias: stop above the failed high, targets below entry.
#[derive(Debug, Clone, Default)]
pub struct ReversalAnalyzer {
    config: ReversalConfig,
}

impl ReversalAnalyzer {
    pub fn new(config: ReversalConfig) -> Self {
        Self { config }
    }
}

impl SignalAnalyzer for ReversalAnalyzer {
    fn analyze(&self, candles: &[Candle]) -> Option<Signal> {
        // Needs at least one swing candle besides the preceding and current ones
        if self.config.lookback < 3 {
            return None;
        }
        let window = tail(candles, self.config.lookback)?;
        let (current, reference) = window.split_last()?;
        let (preceding, swing) = reference.split_last()?;
        let swing_high = highest_high(swing)?;

        if preceding.high <= 0.0 {
            return None;
        }

        let false_breakout = preceding.high > swing_high && current.close < preceding.low;
        let reversal_strength = (preceding.high - current.close) / preceding.high;

        if !false_breakout || reversal_strength <= self.config.min_strength {
            return None;
        }

        let stop_loss = current.high.max(preceding.high);

        Some(Signal::short_entry(
            StrategyKind::Reversal,
            current.close,
            stop_loss,
            self.config.tp2_multiple,
            current.timestamp,
            format!(
                "Failed breakout with strong reversal: high {:.2} > swing {:.2}, close {:.2} < low {:.2}",
                preceding.high, swing_high, current.close, preceding.low
            ),
        ))
    }

    fn lookback(&self) -> usize {
        self.config.lookback
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Reversal
    }
}
