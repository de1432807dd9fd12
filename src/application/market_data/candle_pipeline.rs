use crate::application::strategies::SignalEngine;
use crate::domain::market::{Candle, CandleWindow};
use crate::domain::trading::{RecentSignals, Signal};
use tracing::{debug, info};

/// Rolling window + signal engine + recent signal list.
///
/// Fed from a distributor subscription: each accepted candle extends the
/// window and re-runs every analyzer over it.
pub struct CandlePipeline {
    window: CandleWindow,
    engine: SignalEngine,
    recent: RecentSignals,
}

impl CandlePipeline {
    pub fn new(window_capacity: usize, engine: SignalEngine, signal_capacity: usize) -> Self {
        Self {
            window: CandleWindow::new(window_capacity),
            engine,
            recent: RecentSignals::new(signal_capacity),
        }
    }

    /// Seed the window with history. Signals are not evaluated for seeded
    /// candles.
    pub fn seed(&mut self, history: Vec<Candle>) {
        self.window = CandleWindow::from_history(self.window.capacity(), history);
        info!(
            "CandlePipeline: seeded window with {} candles (capacity {})",
            self.window.len(),
            self.window.capacity()
        );
    }

    /// Append `candle` and evaluate the analyzers. Stale candles are ignored
    /// and yield no signals.
    pub fn on_candle(&mut self, candle: Candle) -> Vec<Signal> {
        if !self.window.push(candle) {
            debug!(
                "CandlePipeline: ignoring stale candle {} (latest {:?})",
                candle.timestamp,
                self.window.latest().map(|c| c.timestamp)
            );
            return Vec::new();
        }

        let signals = self.engine.evaluate(self.window.as_slice());
        if !signals.is_empty() {
            self.recent.prepend(&signals);
        }
        signals
    }

    pub fn recent_signals(&self) -> Vec<Signal> {
        self.recent.to_vec()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.window.latest()
    }

    pub fn window(&self) -> &CandleWindow {
        &self.window
    }
}
