use crate::domain::errors::MarketDataError;
use crate::domain::market::{RawBar, Timeframe};
use crate::domain::ports::PriceFeed;
use crate::infrastructure::core::{HttpClientFactory, HttpSettings, build_url};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, error, warn};
use url::Url;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
const MAX_RANGE_LIMIT: u32 = 50_000;

/// Aggregates (bars) endpoint response
#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    results: Vec<RawBar>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Price feed backed by the Polygon.io aggregates REST API
pub struct PolygonPriceFeed {
    client: ClientWithMiddleware,
    base_url: Url,
    api_key: String,
    settings: HttpSettings,
}

impl PolygonPriceFeed {
    pub fn new(api_key: String, base_url: Url, settings: HttpSettings) -> Self {
        Self {
            client: HttpClientFactory::create_client(settings),
            base_url,
            api_key,
            settings,
        }
    }

    fn aggregates_url(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        sort: SortOrder,
        limit: u32,
    ) -> Result<Url, MarketDataError> {
        let (multiplier, timespan) = timeframe.to_polygon_range();
        let segments = [
            "v2".to_string(),
            "aggs".to_string(),
            "ticker".to_string(),
            instrument.to_string(),
            "range".to_string(),
            multiplier.to_string(),
            timespan.to_string(),
            from.timestamp_millis().to_string(),
            to.timestamp_millis().to_string(),
        ];
        let limit = limit.to_string();
        let params = [
            ("adjusted", "true"),
            ("sort", sort.as_str()),
            ("limit", limit.as_str()),
            ("apiKey", self.api_key.as_str()),
        ];

        build_url(&self.base_url, &segments, &params).ok_or_else(|| {
            MarketDataError::ConnectionLost {
                reason: format!("base url {} cannot carry a path", self.base_url),
            }
        })
    }

    async fn fetch_aggregates(&self, url: Url) -> Result<Vec<RawBar>, MarketDataError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let timed_out = matches!(&e, reqwest_middleware::Error::Reqwest(inner) if inner.is_timeout());
            if timed_out {
                MarketDataError::Timeout {
                    duration_ms: self.settings.timeout.as_millis() as u64,
                }
            } else {
                MarketDataError::ConnectionLost {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response
            .text()
            .await
            .map_err(|e| MarketDataError::ConnectionLost {
                reason: format!("failed to read response body: {}", e),
            })?;

        parse_aggregates(status, retry_after, &body)
    }
}

/// Map an aggregates HTTP response to raw bars
fn parse_aggregates(
    status: StatusCode,
    retry_after: Option<u64>,
    body: &str,
) -> Result<Vec<RawBar>, MarketDataError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        warn!("PolygonPriceFeed: rate limited, retry after {}s", retry_after_secs);
        return Err(MarketDataError::RateLimitExceeded { retry_after_secs });
    }
    if !status.is_success() {
        error!("PolygonPriceFeed: HTTP {}: {}", status, body);
        return Err(MarketDataError::HttpStatus {
            status: status.as_u16(),
            body: body.chars().take(512).collect(),
        });
    }

    let parsed: AggregatesResponse =
        serde_json::from_str(body).map_err(|e| MarketDataError::MalformedResponse {
            reason: e.to_string(),
        })?;

    if let Some(status) = parsed.status.as_deref()
        && matches!(status, "ERROR" | "NOT_AUTHORIZED")
    {
        let reason = parsed
            .error
            .or(parsed.message)
            .unwrap_or_else(|| status.to_string());
        return Err(MarketDataError::MalformedResponse { reason });
    }

    Ok(parsed.results)
}

#[async_trait]
impl PriceFeed for PolygonPriceFeed {
    async fn fetch_range(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RawBar>, MarketDataError> {
        let url = self.aggregates_url(instrument, timeframe, from, to, SortOrder::Asc, MAX_RANGE_LIMIT)?;
        debug!(
            "PolygonPriceFeed: fetching {} {} bars {} -> {}",
            instrument, timeframe, from, to
        );
        self.fetch_aggregates(url).await
    }

    async fn fetch_latest(
        &self,
        instrument: &str,
        timeframe: Timeframe,
    ) -> Result<Option<RawBar>, MarketDataError> {
        let to = Utc::now();
        let from = to - ChronoDuration::hours(24);
        let url = self.aggregates_url(instrument, timeframe, from, to, SortOrder::Desc, 1)?;
        let bars = self.fetch_aggregates(url).await?;
        Ok(bars.into_iter().next())
    }
}
