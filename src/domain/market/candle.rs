use crate::domain::errors::MarketDataError;
use serde::{Deserialize, Serialize};

/// One OHLCV price bar. Prices are in quote currency, timestamp in epoch millis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Width of the bar (high - low).
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    fn validate(&self) -> Result<(), MarketDataError> {
        let invalid = |reason: String| MarketDataError::InvalidBar {
            timestamp: self.timestamp,
            reason,
        };

        let prices = [self.open, self.high, self.low, self.close, self.volume];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(invalid("non-finite value".to_string()));
        }
        if self.volume < 0.0 {
            return Err(invalid(format!("negative volume {}", self.volume)));
        }

        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low || body_high > self.high {
            return Err(invalid(format!(
                "OHLC out of order (o={} h={} l={} c={})",
                self.open, self.high, self.low, self.close
            )));
        }

        Ok(())
    }
}

/// Bar as returned by the price feed. Every field is optional on the wire;
/// normalization into a [`Candle`] rejects incomplete bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub t: Option<i64>,
    pub o: Option<f64>,
    pub h: Option<f64>,
    pub l: Option<f64>,
    pub c: Option<f64>,
    pub v: Option<f64>,
}

impl RawBar {
    pub fn new(t: i64, o: f64, h: f64, l: f64, c: f64, v: f64) -> Self {
        Self {
            t: Some(t),
            o: Some(o),
            h: Some(h),
            l: Some(l),
            c: Some(c),
            v: Some(v),
        }
    }
}

impl From<Candle> for RawBar {
    fn from(candle: Candle) -> Self {
        RawBar::new(
            candle.timestamp,
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            candle.volume,
        )
    }
}

impl TryFrom<RawBar> for Candle {
    type Error = MarketDataError;

    fn try_from(raw: RawBar) -> Result<Self, Self::Error> {
        let missing = |field| MarketDataError::MalformedBar { field };

        let candle = Candle {
            timestamp: raw.t.ok_or_else(|| missing("t"))?,
            open: raw.o.ok_or_else(|| missing("o"))?,
            high: raw.h.ok_or_else(|| missing("h"))?,
            low: raw.l.ok_or_else(|| missing("l"))?,
            close: raw.c.ok_or_else(|| missing("c"))?,
            volume: raw.v.ok_or_else(|| missing("v"))?,
        };
        candle.validate()?;
        Ok(candle)
    }
}

/// Normalize a batch of raw bars, failing on the first bad one.
pub fn normalize_bars(raw: Vec<RawBar>) -> Result<Vec<Candle>, MarketDataError> {
    raw.into_iter().map(Candle::try_from).collect()
}
