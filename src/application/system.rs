use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tracing::info;

use crate::application::market_data::{
    CandlePipeline, DistributorState, PriceDistributor, Subscription,
};
use crate::application::strategies::StrategyFactory;
use crate::config::{Config, Mode};
use crate::domain::ports::PriceFeed;
use crate::domain::trading::Signal;
use crate::infrastructure::{PolygonPriceFeed, SimulatedPriceFeed};

const MOCK_START_PRICE: f64 = 2000.0;
const SIGNAL_CHANNEL_CAPACITY: usize = 64;

fn lock(pipeline: &Mutex<CandlePipeline>) -> MutexGuard<'_, CandlePipeline> {
    pipeline.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Application {
    pub config: Config,
    pub feed: Arc<dyn PriceFeed>,
}

impl Application {
    pub fn build(config: Config) -> Result<Self> {
        info!("Building AurumX Application (Mode: {:?})...", config.mode);

        let feed: Arc<dyn PriceFeed> = match config.mode {
            Mode::Mock => {
                info!("Using simulated gold feed");
                Arc::new(SimulatedPriceFeed::new(MOCK_START_PRICE))
            }
            Mode::Polygon => {
                info!("Using Polygon feed ({})", config.feed.polygon_base_url);
                let api_key = config
                    .feed
                    .polygon_api_key
                    .clone()
                    .context("POLYGON_API_KEY is required in polygon mode")?;
                Arc::new(PolygonPriceFeed::new(
                    api_key,
                    config.feed.polygon_base_url.clone(),
                    config.feed.http,
                ))
            }
        };

        Ok(Self::with_feed(config, feed))
    }

    /// Build around an already constructed feed
    pub fn with_feed(config: Config, feed: Arc<dyn PriceFeed>) -> Self {
        Self { config, feed }
    }

    /// Load history into the candle window, wire the signal pipeline to a new
    /// distributor and start polling.
    pub async fn start(self) -> Result<SystemHandle> {
        let distributor = Arc::new(PriceDistributor::new(
            self.feed,
            self.config.distributor.clone(),
        ));

        let engine = StrategyFactory::create_engine(&self.config.strategy);
        info!(
            "Signal engine ready: {} analyzers, longest lookback {}",
            engine.analyzer_count(),
            engine.max_lookback()
        );
        let mut pipeline = CandlePipeline::new(
            self.config.strategy.window_capacity,
            engine,
            self.config.strategy.signal_capacity,
        );

        let to = Utc::now();
        let span = chrono::Duration::from_std(self.config.distributor.history_span)
            .context("HISTORY_HOURS is out of range")?;
        let history = distributor.get_historical_data(to - span, to).await;
        pipeline.seed(history);

        let pipeline = Arc::new(Mutex::new(pipeline));
        let (signal_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);

        let subscription = {
            let pipeline = Arc::clone(&pipeline);
            let signal_tx = signal_tx.clone();
            distributor.subscribe(move |candle| {
                let signals = lock(&pipeline).on_candle(*candle);
                for signal in signals {
                    // No receivers is fine: the recent list still records it
                    let _ = signal_tx.send(signal);
                }
            })
        };

        distributor.start();
        info!(
            "AurumX running on {} ({} bars every {:?})",
            self.config.distributor.instrument,
            self.config.distributor.live_timeframe,
            self.config.distributor.poll_interval
        );

        Ok(SystemHandle {
            distributor,
            pipeline,
            subscription,
            signal_tx,
        })
    }
}

/// Running system: read-only views for the presentation layer plus shutdown
pub struct SystemHandle {
    distributor: Arc<PriceDistributor>,
    pipeline: Arc<Mutex<CandlePipeline>>,
    subscription: Subscription,
    signal_tx: broadcast::Sender<Signal>,
}

impl SystemHandle {
    /// Most recent signals, newest first
    pub fn recent_signals(&self) -> Vec<Signal> {
        lock(&self.pipeline).recent_signals()
    }

    /// Close of the newest candle in the window
    pub fn latest_price(&self) -> Option<f64> {
        lock(&self.pipeline).latest().map(|c| c.close)
    }

    pub fn window_len(&self) -> usize {
        lock(&self.pipeline).window().len()
    }

    /// Every signal produced from now on
    pub fn subscribe_signals(&self) -> broadcast::Receiver<Signal> {
        self.signal_tx.subscribe()
    }

    pub fn distributor_state(&self) -> DistributorState {
        self.distributor.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<DistributorState> {
        self.distributor.watch_state()
    }

    /// Resume polling after the retry budget was exhausted
    pub fn restart(&self) {
        self.distributor.start();
    }

    /// Unsubscribe the pipeline, disconnect the distributor and return the
    /// final recent-signal list.
    pub fn shutdown(self) -> Vec<Signal> {
        info!("Shutting down AurumX...");
        self.subscription.unsubscribe();
        self.distributor.disconnect();
        self.recent_signals()
    }
}
