//! Distributor configuration parsing from environment variables.
//!
//! Polling cadence, request timeout, retry budget and timeframes.

use super::EnvReader;
use crate::application::market_data::{DistributorConfig, RetryPolicy};
use crate::domain::market::Timeframe;
use anyhow::Result;
use std::time::Duration;

pub struct DistributorEnvConfig;

impl DistributorEnvConfig {
    pub(crate) fn from_reader(reader: &EnvReader<'_>, instrument: &str) -> Result<DistributorConfig> {
        let poll_interval = reader.millis("POLL_INTERVAL_MS", 5_000)?;
        if poll_interval.is_zero() {
            anyhow::bail!("POLL_INTERVAL_MS must be greater than 0");
        }

        let retry = RetryPolicy {
            max_attempts: reader.parse("RETRY_MAX_ATTEMPTS", 3)?,
            base_delay: reader.millis("RETRY_BASE_DELAY_MS", 1_000)?,
            max_delay: reader.millis("RETRY_MAX_DELAY_MS", 30_000)?,
        };
        if retry.max_attempts == 0 {
            anyhow::bail!("RETRY_MAX_ATTEMPTS must be at least 1");
        }
        if retry.base_delay > retry.max_delay {
            anyhow::bail!(
                "RETRY_BASE_DELAY_MS ({:?}) exceeds RETRY_MAX_DELAY_MS ({:?})",
                retry.base_delay,
                retry.max_delay
            );
        }

        let history_hours: u64 = reader.parse("HISTORY_HOURS", 24)?;

        Ok(DistributorConfig {
            instrument: instrument.to_string(),
            live_timeframe: reader.parse("LIVE_TIMEFRAME", Timeframe::OneMin)?,
            history_timeframe: reader.parse("HISTORY_TIMEFRAME", Timeframe::FiveMin)?,
            history_span: Duration::from_secs(history_hours * 3600),
            poll_interval,
            request_timeout: reader.millis("REQUEST_TIMEOUT_MS", 10_000)?,
            retry,
        })
    }
}
