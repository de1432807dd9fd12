// Trading signals and their bounded history
pub mod recent_signals;
pub mod signal;

pub use recent_signals::RecentSignals;
pub use signal::{Bias, Signal, SignalType, StrategyKind};
