pub mod backoff;
pub mod candle_pipeline;
pub mod price_distributor;

pub use backoff::RetryPolicy;
pub use candle_pipeline::CandlePipeline;
pub use price_distributor::{
    DistributorConfig, DistributorState, PriceDistributor, Subscription, SubscriptionId,
};
