//! Strategy configuration parsing from environment variables.
//!
//! Analyzer thresholds and toggles, plus the candle window and signal list
//! sizes of the pipeline.

use super::EnvReader;
use crate::application::strategies::{BreakoutConfig, DeepValueConfig, ReversalConfig};
use anyhow::Result;

/// Strategy environment configuration
#[derive(Debug, Clone)]
pub struct StrategyEnvConfig {
    /// Candles kept in the rolling window
    pub window_capacity: usize,
    /// Most-recent signals kept for display
    pub signal_capacity: usize,

    pub deep_value_enabled: bool,
    pub deep_value: DeepValueConfig,

    pub breakout_enabled: bool,
    pub breakout: BreakoutConfig,

    pub reversal_enabled: bool,
    pub reversal: ReversalConfig,
}

impl Default for StrategyEnvConfig {
    fn default() -> Self {
        Self {
            window_capacity: 288, // 24h of 5-min candles
            signal_capacity: 5,
            deep_value_enabled: true,
            deep_value: DeepValueConfig::default(),
            breakout_enabled: true,
            breakout: BreakoutConfig::default(),
            reversal_enabled: true,
            reversal: ReversalConfig::default(),
        }
    }
}

impl StrategyEnvConfig {
    pub(crate) fn from_reader(reader: &EnvReader<'_>) -> Result<Self> {
        let defaults = Self::default();

        let deep_value = DeepValueConfig {
            lookback: reader.parse("DEEP_VALUE_LOOKBACK", defaults.deep_value.lookback)?,
            min_drop_pct: reader.parse("DEEP_VALUE_MIN_DROP_PCT", defaults.deep_value.min_drop_pct)?,
            min_recovery: reader.parse("DEEP_VALUE_MIN_RECOVERY", defaults.deep_value.min_recovery)?,
            ..defaults.deep_value
        };
        let breakout = BreakoutConfig {
            lookback: reader.parse("BREAKOUT_LOOKBACK", defaults.breakout.lookback)?,
            min_strength: reader.parse("BREAKOUT_MIN_STRENGTH", defaults.breakout.min_strength)?,
            ..defaults.breakout
        };
        let reversal = ReversalConfig {
            lookback: reader.parse("REVERSAL_LOOKBACK", defaults.reversal.lookback)?,
            min_strength: reader.parse("REVERSAL_MIN_STRENGTH", defaults.reversal.min_strength)?,
            ..defaults.reversal
        };

        if deep_value.lookback < 1 {
            anyhow::bail!("DEEP_VALUE_LOOKBACK must be at least 1");
        }
        if breakout.lookback < 2 {
            anyhow::bail!("BREAKOUT_LOOKBACK must be at least 2");
        }
        if reversal.lookback < 3 {
            anyhow::bail!("REVERSAL_LOOKBACK must be at least 3");
        }

        let window_capacity = reader.parse("WINDOW_CAPACITY", defaults.window_capacity)?;
        let longest = deep_value.lookback.max(breakout.lookback).max(reversal.lookback);
        if window_capacity < longest {
            anyhow::bail!(
                "WINDOW_CAPACITY ({}) is smaller than the longest lookback ({})",
                window_capacity,
                longest
            );
        }

        Ok(Self {
            window_capacity,
            signal_capacity: reader.parse("SIGNAL_CAPACITY", defaults.signal_capacity)?,
            deep_value_enabled: reader.parse("DEEP_VALUE_ENABLED", true)?,
            deep_value,
            breakout_enabled: reader.parse("BREAKOUT_ENABLED", true)?,
            breakout,
            reversal_enabled: reader.parse("REVERSAL_ENABLED", true)?,
            reversal,
        })
    }
}
