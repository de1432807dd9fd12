// Market data domain (candles, window, timeframes)
pub mod market;

// Port interfaces
pub mod ports;

// Trading signals
pub mod trading;

// Domain-specific error types
pub mod errors;
