mod breakout;
mod deep_value;
mod reversal;
mod signal_engine;
mod traits;

#[cfg(test)]
pub(crate) mod tests;

pub use breakout::{BreakoutAnalyzer, BreakoutConfig};
pub use deep_value::{DeepValueAnalyzer, DeepValueConfig, recovery_strength};
pub use reversal::{ReversalAnalyzer, ReversalConfig};
pub use signal_engine::SignalEngine;
pub use traits::SignalAnalyzer;

use crate::config::StrategyEnvConfig;
use std::sync::Arc;

pub struct StrategyFactory;

impl StrategyFactory {
    /// Build the engine from configuration, skipping disabled analyzers.
    /// Order is fixed: deep value, breakout, reversal.
    pub fn create_engine(config: &StrategyEnvConfig) -> SignalEngine {
        let mut analyzers: Vec<Arc<dyn SignalAnalyzer>> = Vec::with_capacity(3);

        if config.deep_value_enabled {
            analyzers.push(Arc::new(DeepValueAnalyzer::new(config.deep_value)));
        }
        if config.breakout_enabled {
            analyzers.push(Arc::new(BreakoutAnalyzer::new(config.breakout)));
        }
        if config.reversal_enabled {
            analyzers.push(Arc::new(ReversalAnalyzer::new(config.reversal)));
        }

        SignalEngine::new(analyzers)
    }
}
