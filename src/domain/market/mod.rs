// Market data domain
pub mod candle;
pub mod candle_window;
pub mod timeframe;

pub use candle::{Candle, RawBar};
pub use candle_window::CandleWindow;
pub use timeframe::Timeframe;
