// Price streaming and the candle -> signal pipeline
pub mod market_data;

// Signal analyzers
pub mod strategies;

// System orchestrator
pub mod system;
