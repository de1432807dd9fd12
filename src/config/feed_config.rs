//! Price feed configuration parsing from environment variables.

use super::EnvReader;
use crate::infrastructure::core::HttpSettings;
use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

/// Feed environment configuration
#[derive(Debug, Clone)]
pub struct FeedEnvConfig {
    pub instrument: String,
    pub polygon_api_key: Option<String>,
    pub polygon_base_url: Url,
    pub http: HttpSettings,
}

impl FeedEnvConfig {
    pub(crate) fn from_reader(reader: &EnvReader<'_>) -> Result<Self> {
        let base_url = reader.string("POLYGON_BASE_URL", "https://api.polygon.io");
        let polygon_base_url = Url::parse(&base_url).context("Failed to parse POLYGON_BASE_URL")?;
        if polygon_base_url.cannot_be_a_base() {
            anyhow::bail!("POLYGON_BASE_URL must be an http(s) base URL, got {}", base_url);
        }

        Ok(Self {
            instrument: reader.string("INSTRUMENT", "C:XAUUSD"),
            polygon_api_key: reader.var("POLYGON_API_KEY"),
            polygon_base_url,
            http: HttpSettings {
                timeout: Duration::from_secs(reader.parse("HTTP_TIMEOUT_SECS", 30)?),
                max_retries: reader.parse("HTTP_MAX_RETRIES", 3)?,
            },
        })
    }
}
