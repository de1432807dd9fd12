use crate::domain::errors::MarketDataError;
use crate::domain::market::{RawBar, Timeframe};
use crate::domain::ports::PriceFeed;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type LatestResult = Result<Option<RawBar>, MarketDataError>;

/// Price feed that replays scripted responses, for tests and demos.
///
/// `fetch_latest` pops queued responses in order; once the queue is empty it
/// keeps returning the `when_exhausted` response (no bar by default).
pub struct ScriptedPriceFeed {
    latest: Mutex<VecDeque<LatestResult>>,
    when_exhausted: Mutex<LatestResult>,
    range: Mutex<Result<Vec<RawBar>, MarketDataError>>,
    latency: Mutex<Option<Duration>>,
    latest_calls: AtomicUsize,
    range_calls: AtomicUsize,
}

impl ScriptedPriceFeed {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(VecDeque::new()),
            when_exhausted: Mutex::new(Ok(None)),
            range: Mutex::new(Ok(Vec::new())),
            latency: Mutex::new(None),
            latest_calls: AtomicUsize::new(0),
            range_calls: AtomicUsize::new(0),
        }
    }

    pub fn push_latest(&self, response: LatestResult) {
        lock(&self.latest).push_back(response);
    }

    pub fn push_bar(&self, bar: RawBar) {
        self.push_latest(Ok(Some(bar)));
    }

    pub fn push_failure(&self, error: MarketDataError) {
        self.push_latest(Err(error));
    }

    pub fn set_when_exhausted(&self, response: LatestResult) {
        *lock(&self.when_exhausted) = response;
    }

    pub fn set_range(&self, response: Result<Vec<RawBar>, MarketDataError>) {
        *lock(&self.range) = response;
    }

    /// Delay every call by `latency` before answering
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = Some(latency);
    }

    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    pub fn range_calls(&self) -> usize {
        self.range_calls.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for ScriptedPriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceFeed for ScriptedPriceFeed {
    async fn fetch_range(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<RawBar>, MarketDataError> {
        self.range_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        debug!("ScriptedPriceFeed: range request {} {}", instrument, timeframe);
        lock(&self.range).clone()
    }

    async fn fetch_latest(
        &self,
        _instrument: &str,
        _timeframe: Timeframe,
    ) -> Result<Option<RawBar>, MarketDataError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        let scripted = lock(&self.latest).pop_front();
        scripted.unwrap_or_else(|| lock(&self.when_exhausted).clone())
    }
}

#[derive(Debug, Clone, Copy)]
struct WalkState {
    price: f64,
    last: Option<RawBar>,
}

/// Random-walk gold feed used in mock mode.
///
/// Bars are aligned to the requested timeframe; repeated polls within the same
/// period return the same bar, like a real aggregates endpoint would.
pub struct SimulatedPriceFeed {
    rng: Mutex<StdRng>,
    state: Mutex<WalkState>,
    volatility: f64,
}

impl SimulatedPriceFeed {
    const MAX_RANGE_BARS: usize = 5_000;

    pub fn new(start_price: f64) -> Self {
        Self::with_rng(start_price, StdRng::from_os_rng())
    }

    /// Deterministic walk for tests
    pub fn with_seed(start_price: f64, seed: u64) -> Self {
        Self::with_rng(start_price, StdRng::seed_from_u64(seed))
    }

    fn with_rng(start_price: f64, rng: StdRng) -> Self {
        info!(
            "SimulatedPriceFeed: starting random walk at {:.2}",
            start_price
        );
        Self {
            rng: Mutex::new(rng),
            state: Mutex::new(WalkState {
                price: start_price,
                last: None,
            }),
            volatility: 0.0008,
        }
    }

    fn next_bar(&self, price: f64, timestamp: i64) -> RawBar {
        let mut rng = lock(&self.rng);
        let vol = self.volatility;

        let open = price;
        let close = open * (1.0 + rng.random_range(-vol..vol));
        let high = open.max(close) * (1.0 + rng.random_range(0.0..vol / 2.0));
        let low = open.min(close) * (1.0 - rng.random_range(0.0..vol / 2.0));
        let volume = rng.random_range(50.0..500.0_f64).round();

        RawBar::new(timestamp, open, high, low, close, volume)
    }

    fn bucket(timestamp_ms: i64, timeframe: Timeframe) -> i64 {
        let period = timeframe.duration().as_millis() as i64;
        timestamp_ms - timestamp_ms.rem_euclid(period)
    }
}

#[async_trait]
impl PriceFeed for SimulatedPriceFeed {
    async fn fetch_range(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RawBar>, MarketDataError> {
        let period = timeframe.duration().as_millis() as i64;
        let first = Self::bucket(from.timestamp_millis(), timeframe);
        let end = to.timestamp_millis();
        if end < first {
            return Ok(Vec::new());
        }

        let count = (((end - first) / period) as usize + 1).min(Self::MAX_RANGE_BARS);
        let start = Self::bucket(end, timeframe) - (count as i64 - 1) * period;

        // Walk backwards from the current price so history joins the live bars
        let mut price = lock(&self.state).price;
        let mut bars: Vec<RawBar> = (0..count)
            .rev()
            .map(|i| {
                let bar = self.next_bar(price, start + i as i64 * period);
                price = bar.c.unwrap_or(price);
                RawBar {
                    o: bar.c,
                    c: bar.o,
                    ..bar
                }
            })
            .collect();
        bars.reverse();

        debug!(
            "SimulatedPriceFeed: generated {} {} bars for {}",
            bars.len(),
            timeframe,
            instrument
        );
        Ok(bars)
    }

    async fn fetch_latest(
        &self,
        _instrument: &str,
        timeframe: Timeframe,
    ) -> Result<Option<RawBar>, MarketDataError> {
        let timestamp = Self::bucket(Utc::now().timestamp_millis(), timeframe);

        let price = {
            let state = lock(&self.state);
            if let Some(last) = state.last
                && last.t == Some(timestamp)
            {
                return Ok(Some(last));
            }
            state.price
        };

        let bar = self.next_bar(price, timestamp);
        let mut state = lock(&self.state);
        state.price = bar.c.unwrap_or(price);
        state.last = Some(bar);
        Ok(Some(bar))
    }
}
