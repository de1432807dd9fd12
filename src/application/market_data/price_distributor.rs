//! Streaming price distributor.
//!
//! Polls the latest bar from a [`PriceFeed`], drops bars whose timestamp does
//! not advance, and fans the rest out to registered callbacks. Feed failures
//! never escape: they move the distributor into a capped backoff and, once the
//! retry budget is spent, into an idle `Exhausted` state. A panicking callback
//! is logged and skipped.

use super::backoff::RetryPolicy;
use crate::domain::errors::MarketDataError;
use crate::domain::market::candle::normalize_bars;
use crate::domain::market::{Candle, Timeframe};
use crate::domain::ports::PriceFeed;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct DistributorConfig {
    pub instrument: String,
    /// Timeframe of the bars polled while active
    pub live_timeframe: Timeframe,
    /// Timeframe used by `get_historical_data`
    pub history_timeframe: Timeframe,
    /// How far back the application loads history on start
    pub history_span: Duration,
    pub poll_interval: Duration,
    /// Upper bound on a single feed call
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            instrument: "C:XAUUSD".to_string(),
            live_timeframe: Timeframe::OneMin,
            history_timeframe: Timeframe::FiveMin,
            history_span: Duration::from_secs(24 * 3600),
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Lifecycle of a [`PriceDistributor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributorState {
    /// Constructed, `start` not called yet
    Idle,
    Initializing,
    Active,
    /// Waiting out the backoff after `attempt` consecutive failures
    Retrying { attempt: u32 },
    /// Retry budget spent; silent until `start` is called again
    Exhausted,
    /// Disconnected. Terminal.
    Stopped,
}

impl fmt::Display for DistributorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributorState::Idle => write!(f, "IDLE"),
            DistributorState::Initializing => write!(f, "INITIALIZING"),
            DistributorState::Active => write!(f, "ACTIVE"),
            DistributorState::Retrying { attempt } => write!(f, "RETRYING({})", attempt),
            DistributorState::Exhausted => write!(f, "EXHAUSTED"),
            DistributorState::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Stable handle identifying one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn Fn(&Candle) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    callback: Callback,
    /// Timestamp of the newest candle handed to `callback`
    delivered: Mutex<Option<i64>>,
}

impl Subscriber {
    /// Hand `candle` to the callback unless an equal or newer one already got
    /// there. Held across the call, so a replay and a live bar never interleave.
    fn deliver(&self, candle: &Candle) {
        let mut delivered = lock(&self.delivered);
        if (*delivered).is_some_and(|ts| candle.timestamp <= ts) {
            return;
        }
        *delivered = Some(candle.timestamp);

        let callback = &self.callback;
        if panic::catch_unwind(AssertUnwindSafe(|| callback(candle))).is_err() {
            error!(
                "PriceDistributor: subscriber {:?} panicked on bar {}",
                self.id, candle.timestamp
            );
        }
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: BTreeMap<SubscriptionId, Arc<Subscriber>>,
    last: Option<Candle>,
}

struct Shared {
    feed: Arc<dyn PriceFeed>,
    config: DistributorConfig,
    registry: Mutex<Registry>,
    state: watch::Sender<DistributorState>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn set_state(&self, next: DistributorState) {
        let mut previous = next;
        let changed = self.state.send_if_modified(|state| {
            if *state == next || *state == DistributorState::Stopped {
                return false;
            }
            previous = *state;
            *state = next;
            true
        });
        if changed {
            info!("PriceDistributor: {} -> {}", previous, next);
        }
    }

    fn current_state(&self) -> DistributorState {
        *self.state.borrow()
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        lock(&self.registry).subscribers.remove(&id).is_some()
    }

    /// Store and broadcast `candle` if its timestamp advances past the last one.
    fn publish(&self, candle: Candle) -> bool {
        let subscribers: Vec<Arc<Subscriber>> = {
            let mut registry = lock(&self.registry);
            if self.current_state() == DistributorState::Stopped {
                return false;
            }
            if let Some(last) = registry.last
                && candle.timestamp <= last.timestamp
            {
                debug!(
                    "PriceDistributor: dropping bar {} (last delivered {})",
                    candle.timestamp, last.timestamp
                );
                return false;
            }
            registry.last = Some(candle);
            registry.subscribers.values().cloned().collect()
        };

        debug!(
            "PriceDistributor: delivering bar {} close={:.2} to {} subscribers",
            candle.timestamp,
            candle.close,
            subscribers.len()
        );
        for subscriber in &subscribers {
            subscriber.deliver(&candle);
        }
        true
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, MarketDataError>>,
    ) -> Result<T, MarketDataError> {
        let limit = self.config.request_timeout;
        time::timeout(limit, call)
            .await
            .map_err(|_| MarketDataError::Timeout {
                duration_ms: limit.as_millis() as u64,
            })?
    }

    async fn poll_latest(&self) -> Result<(), MarketDataError> {
        let raw = self
            .with_timeout(
                self.feed
                    .fetch_latest(&self.config.instrument, self.config.live_timeframe),
            )
            .await?;

        if let Some(raw) = raw {
            self.publish(Candle::try_from(raw)?);
        }
        Ok(())
    }

    /// Poll at the fixed interval until a poll fails. Ticks never overlap: each
    /// poll completes before the next tick is awaited.
    async fn poll_until_failure(&self) -> MarketDataError {
        let period = self.config.poll_interval.max(Duration::from_millis(1));
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.poll_latest().await {
                return e;
            }
        }
    }

    /// Backoff before the next attempt. A rate limit is waited out in full
    /// even when it exceeds the policy cap.
    fn backoff_delay(&self, failure: &MarketDataError, failures: u32) -> Duration {
        let delay = self.config.retry.delay_for(failures);
        match failure {
            MarketDataError::RateLimitExceeded { retry_after_secs } => {
                delay.max(Duration::from_secs(*retry_after_secs))
            }
            _ => delay,
        }
    }

    async fn run(self: Arc<Self>) {
        let policy = self.config.retry;
        let mut failures: u32 = 0;

        loop {
            let failure = match self.poll_latest().await {
                Ok(()) => {
                    failures = 0;
                    self.set_state(DistributorState::Active);
                    self.poll_until_failure().await
                }
                Err(e) => e,
            };

            failures += 1;
            if !failure.is_retryable() || policy.is_exhausted(failures) {
                let exhausted = MarketDataError::RetriesExhausted {
                    attempts: failures,
                    last_error: failure.to_string(),
                };
                error!(
                    "PriceDistributor [{}]: {}. Polling stopped until restarted",
                    self.config.instrument, exhausted
                );
                self.set_state(DistributorState::Exhausted);
                return;
            }

            let delay = self.backoff_delay(&failure, failures);
            if failure.is_malformed() {
                error!(
                    "PriceDistributor [{}]: malformed data {}/{}: {}. Retrying in {:?}",
                    self.config.instrument, failures, policy.max_attempts, failure, delay
                );
            } else {
                warn!(
                    "PriceDistributor [{}]: feed failure {}/{}: {}. Retrying in {:?}",
                    self.config.instrument, failures, policy.max_attempts, failure, delay
                );
            }
            self.set_state(DistributorState::Retrying { attempt: failures });
            time::sleep(delay).await;
        }
    }
}

/// Registration returned by [`PriceDistributor::subscribe`].
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
    id: SubscriptionId,
    shared: Weak<Shared>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Deregister the callback. Further calls are no-ops.
    pub fn unsubscribe(&self) {
        if let Some(shared) = self.shared.upgrade()
            && shared.remove(self.id)
        {
            debug!("PriceDistributor: subscription {:?} removed", self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Owner-controlled price distributor. Construct one per feed connection,
/// call [`start`](Self::start), and [`disconnect`](Self::disconnect) when done.
pub struct PriceDistributor {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PriceDistributor {
    pub fn new(feed: Arc<dyn PriceFeed>, config: DistributorConfig) -> Self {
        let (state, _) = watch::channel(DistributorState::Idle);
        Self {
            shared: Arc::new(Shared {
                feed,
                config,
                registry: Mutex::new(Registry::default()),
                state,
            }),
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &DistributorConfig {
        &self.shared.config
    }

    /// Fetch candles between `from` and `to`, ascending.
    ///
    /// Never fails: any feed error, timeout or malformed bar is logged and
    /// yields an empty vector, which callers should read as "no data yet".
    pub async fn get_historical_data(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Candle> {
        let config = &self.shared.config;
        let result = self
            .shared
            .with_timeout(self.shared.feed.fetch_range(
                &config.instrument,
                config.history_timeframe,
                from,
                to,
            ))
            .await
            .and_then(normalize_bars);

        match result {
            Ok(mut candles) => {
                candles.sort_by_key(|c| c.timestamp);
                candles.dedup_by_key(|c| c.timestamp);
                info!(
                    "PriceDistributor [{}]: loaded {} {} candles",
                    config.instrument,
                    candles.len(),
                    config.history_timeframe
                );
                candles
            }
            Err(e) => {
                warn!(
                    "PriceDistributor [{}]: historical fetch failed, returning no data: {}",
                    config.instrument, e
                );
                Vec::new()
            }
        }
    }

    /// Register `callback` for every newly observed candle.
    ///
    /// If a candle has already been observed it is delivered to `callback`
    /// before this returns. Callbacks run on the polling task and may
    /// subscribe or unsubscribe from inside a delivery.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Candle) + Send + Sync + 'static,
    {
        let (subscriber, replay) = {
            let mut registry = lock(&self.shared.registry);
            registry.next_id += 1;
            let subscriber = Arc::new(Subscriber {
                id: SubscriptionId(registry.next_id),
                callback: Box::new(callback),
                delivered: Mutex::new(None),
            });
            registry
                .subscribers
                .insert(subscriber.id, Arc::clone(&subscriber));
            (subscriber, registry.last)
        };
        let id = subscriber.id;

        debug!("PriceDistributor: subscription {:?} registered", id);
        if let Some(candle) = replay {
            subscriber.deliver(&candle);
        }

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Returns false when `id` was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.remove(id)
    }

    /// Spawn the polling task. No-op while running or after `disconnect`;
    /// restarts polling after retries were exhausted.
    pub fn start(&self) {
        let mut task = lock(&self.task);
        match self.state() {
            DistributorState::Stopped => {
                warn!("PriceDistributor: start after disconnect ignored; create a new distributor");
                return;
            }
            DistributorState::Initializing
            | DistributorState::Active
            | DistributorState::Retrying { .. }
                if task.as_ref().is_some_and(|handle| !handle.is_finished()) =>
            {
                debug!("PriceDistributor: already running");
                return;
            }
            _ => {}
        }

        // An exhausted task may not have returned yet after publishing its state
        if let Some(previous) = task.take() {
            previous.abort();
        }
        self.shared.set_state(DistributorState::Initializing);

        info!(
            "PriceDistributor [{}]: starting ({} bars every {:?})",
            self.shared.config.instrument,
            self.shared.config.live_timeframe,
            self.shared.config.poll_interval
        );
        let shared = Arc::clone(&self.shared);
        *task = Some(tokio::spawn(shared.run()));
    }

    /// Cancel polling and any pending retry, clear subscribers. Idempotent.
    pub fn disconnect(&self) {
        let mut task = lock(&self.task);
        if let Some(handle) = task.take() {
            handle.abort();
        }

        let mut registry = lock(&self.shared.registry);
        self.shared.set_state(DistributorState::Stopped);
        drop(task);
        registry.subscribers.clear();
        registry.last = None;
    }

    pub fn state(&self) -> DistributorState {
        self.shared.current_state()
    }

    /// Receiver of state transitions
    pub fn watch_state(&self) -> watch::Receiver<DistributorState> {
        self.shared.state.subscribe()
    }

    pub fn last_candle(&self) -> Option<Candle> {
        lock(&self.shared.registry).last
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.registry).subscribers.len()
    }
}

impl Drop for PriceDistributor {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }
}
