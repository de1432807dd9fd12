use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Bar interval requested from the price feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    OneMin,
    FiveMin,
    FifteenMin,
    OneHour,
    OneDay,
}

impl Timeframe {
    /// Returns the duration of this timeframe in minutes
    pub fn to_minutes(&self) -> u64 {
        match self {
            Timeframe::OneMin => 1,
            Timeframe::FiveMin => 5,
            Timeframe::FifteenMin => 15,
            Timeframe::OneHour => 60,
            Timeframe::OneDay => 1440,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.to_minutes() * 60)
    }

    /// Polygon aggregates encode the interval as `{multiplier}/{timespan}`
    pub fn to_polygon_range(&self) -> (u32, &'static str) {
        match self {
            Timeframe::OneMin => (1, "minute"),
            Timeframe::FiveMin => (5, "minute"),
            Timeframe::FifteenMin => (15, "minute"),
            Timeframe::OneHour => (1, "hour"),
            Timeframe::OneDay => (1, "day"),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::OneMin => "1Min",
            Timeframe::FiveMin => "5Min",
            Timeframe::FifteenMin => "15Min",
            Timeframe::OneHour => "1Hour",
            Timeframe::OneDay => "1Day",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "1min" | "1m" => Ok(Timeframe::OneMin),
            "5min" | "5m" => Ok(Timeframe::FiveMin),
            "15min" | "15m" => Ok(Timeframe::FifteenMin),
            "1hour" | "1h" => Ok(Timeframe::OneHour),
            "1day" | "1d" => Ok(Timeframe::OneDay),
            _ => Err(anyhow!(
                "Invalid timeframe: {}. Must be one of 1Min, 5Min, 15Min, 1Hour, 1Day",
                s
            )),
        }
    }
}
