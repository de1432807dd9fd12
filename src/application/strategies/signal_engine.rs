use super::traits::SignalAnalyzer;
use super::{BreakoutAnalyzer, DeepValueAnalyzer, ReversalAnalyzer};
use crate::domain::market::Candle;
use crate::domain::trading::Signal;
use std::sync::Arc;
use tracing::info;

/// Runs every registered analyzer over the same window.
///
/// Analyzers are evaluated in registration order and the returned signals keep
/// that order.
#[derive(Clone)]
pub struct SignalEngine {
    analyzers: Vec<Arc<dyn SignalAnalyzer>>,
}

impl SignalEngine {
    pub fn new(analyzers: Vec<Arc<dyn SignalAnalyzer>>) -> Self {
        Self { analyzers }
    }

    /// Deep-value, breakout and reversal with their default parameters
    pub fn standard() -> Self {
        Self::new(vec![
            Arc::new(DeepValueAnalyzer::default()),
            Arc::new(BreakoutAnalyzer::default()),
            Arc::new(ReversalAnalyzer::default()),
        ])
    }

    pub fn evaluate(&self, candles: &[Candle]) -> Vec<Signal> {
        self.analyzers
            .iter()
            .filter_map(|analyzer| {
                let signal = analyzer.analyze(candles)?;
                info!("SignalEngine [{}]: {}", analyzer.kind(), signal);
                Some(signal)
            })
            .collect()
    }

    /// Longest lookback among the analyzers (0 when empty)
    pub fn max_lookback(&self) -> usize {
        self.analyzers
            .iter()
            .map(|a| a.lookback())
            .max()
            .unwrap_or(0)
    }

    pub fn analyzer_count(&self) -> usize {
        self.analyzers.len()
    }
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::standard()
    }
}
