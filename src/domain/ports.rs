use crate::domain::errors::MarketDataError;
use crate::domain::market::{RawBar, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of OHLCV bars for one instrument.
///
/// Implementations return the feed's raw bars; normalization and validation
/// happen in the distributor so every adapter gets the same treatment.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// All bars of `timeframe` between `from` and `to`, ascending.
    async fn fetch_range(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RawBar>, MarketDataError>;

    /// Most recent bar, or `None` when the feed has nothing yet (e.g. market closed).
    async fn fetch_latest(
        &self,
        instrument: &str,
        timeframe: Timeframe,
    ) -> Result<Option<RawBar>, MarketDataError>;
}
