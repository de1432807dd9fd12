use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    Entry,
    Exit,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalType::Entry => write!(f, "ENTRY"),
            SignalType::Exit => write!(f, "EXIT"),
        }
    }
}

/// Strategy that produced a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    DeepValue,
    /// Breakout with volume confirmation
    MonthlyIncome,
    Reversal,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::DeepValue => write!(f, "DEEP_VALUE"),
            StrategyKind::MonthlyIncome => write!(f, "MONTHLY_INCOME"),
            StrategyKind::Reversal => write!(f, "REVERSAL"),
        }
    }
}

/// Expected direction of the trade a signal recommends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    Long,
    Short,
}

/// A single advisory trade recommendation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub strategy: StrategyKind,
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit1: f64,
    pub take_profit2: f64,
    pub timestamp: i64,
    pub reason: String,
}

impl Signal {
    /// Long entry at `price` with targets at 1R and `tp2_multiple` R above it.
    pub fn long_entry(
        strategy: StrategyKind,
        price: f64,
        stop_loss: f64,
        tp2_multiple: f64,
        timestamp: i64,
        reason: impl Into<String>,
    ) -> Self {
        let risk = price - stop_loss;
        Self {
            signal_type: SignalType::Entry,
            strategy,
            price,
            stop_loss,
            take_profit1: price + risk,
            take_profit2: price + risk * tp2_multiple,
            timestamp,
            reason: reason.into(),
        }
    }

    /// Short entry: stop above `price`, targets below it.
    pub fn short_entry(
        strategy: StrategyKind,
        price: f64,
        stop_loss: f64,
        tp2_multiple: f64,
        timestamp: i64,
        reason: impl Into<String>,
    ) -> Self {
        let risk = stop_loss - price;
        Self {
            signal_type: SignalType::Entry,
            strategy,
            price,
            stop_loss,
            take_profit1: price - risk,
            take_profit2: price - risk * tp2_multiple,
            timestamp,
            reason: reason.into(),
        }
    }

    pub fn bias(&self) -> Bias {
        if self.stop_loss > self.price {
            Bias::Short
        } else {
            Bias::Long
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {:.2} (SL {:.2}, TP1 {:.2}, TP2 {:.2}) - {}",
            self.strategy,
            self.signal_type,
            self.price,
            self.stop_loss,
            self.take_profit1,
            self.take_profit2,
            self.reason
        )
    }
}
