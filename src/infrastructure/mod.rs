pub mod core;
pub mod mock;
pub mod polygon;

pub use mock::{ScriptedPriceFeed, SimulatedPriceFeed};
pub use polygon::PolygonPriceFeed;
