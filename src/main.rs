//! AurumX - gold price streaming and signal detection
//!
//! Streams XAU/USD candles from the configured feed, runs the signal analyzers
//! on every new candle and logs each signal as a JSON line.
//!
//! # Usage
//! ```sh
//! MODE=polygon POLYGON_API_KEY=... cargo run
//! ```

use anyhow::Result;
use aurumx::application::system::Application;
use aurumx::config::Config;
use tokio::sync::broadcast::error::RecvError;
use tracing::{Level, error, info, warn};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("AurumX {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: Mode={:?}, Instrument={}, Poll={:?}",
        config.mode, config.distributor.instrument, config.distributor.poll_interval
    );

    let app = Application::build(config)?;
    let handle = app.start().await?;

    let mut signals = handle.subscribe_signals();
    let signal_logger = tokio::spawn(async move {
        loop {
            match signals.recv().await {
                Ok(signal) => match serde_json::to_string(&signal) {
                    Ok(line) => println!("{}", line),
                    Err(e) => error!("Failed to serialize signal: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Signal logger lagged, skipped {} signals", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut states = handle.watch_state();
    let state_logger = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            info!("Distributor state: {}", state);
        }
    });

    info!("Running. Press Ctrl+C to shutdown.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received.");

    let final_signals = handle.shutdown();
    signal_logger.abort();
    state_logger.abort();

    info!("Recent signals ({}):", final_signals.len());
    for signal in &final_signals {
        info!("  {}", signal);
    }

    Ok(())
}
