//! Configuration module for AurumX.
//!
//! Everything is loaded from environment variables (optionally via `.env`),
//! organized by concern: Feed, Distributor and Strategy. `Config::from_lookup`
//! takes an arbitrary key lookup instead of the process environment.

mod distributor_config;
mod feed_config;
mod strategy_config;

pub use distributor_config::DistributorEnvConfig;
pub use feed_config::FeedEnvConfig;
pub use strategy_config::StrategyEnvConfig;

use crate::application::market_data::DistributorConfig;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Reads configuration values through a key lookup
pub struct EnvReader<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> EnvReader<'a> {
    pub fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    /// Trimmed value, None when unset or blank
    pub fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn string(&self, key: &str, default: &str) -> String {
        self.var(key).unwrap_or_else(|| default.to_string())
    }

    pub fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.var(key) {
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| anyhow!("{}: {:?}", e, raw))
                .context(format!("Failed to parse {}", key)),
            None => Ok(default),
        }
    }

    pub fn millis(&self, key: &str, default_ms: u64) -> Result<Duration> {
        self.parse(key, default_ms).map(Duration::from_millis)
    }
}

/// Application execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Offline random-walk feed
    Mock,
    Polygon,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Mode::Mock),
            "polygon" => Ok(Mode::Polygon),
            _ => anyhow::bail!("Invalid MODE: {}. Must be 'mock' or 'polygon'", s),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub feed: FeedEnvConfig,
    pub distributor: DistributorConfig,
    pub strategy: StrategyEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let reader = EnvReader::new(lookup);

        let mode: Mode = reader.parse("MODE", Mode::Mock)?;
        let feed = FeedEnvConfig::from_reader(&reader).context("Failed to load feed config")?;
        let distributor = DistributorEnvConfig::from_reader(&reader, &feed.instrument)
            .context("Failed to load distributor config")?;
        let strategy =
            StrategyEnvConfig::from_reader(&reader).context("Failed to load strategy config")?;

        if mode == Mode::Polygon && feed.polygon_api_key.is_none() {
            anyhow::bail!("MODE=polygon requires POLYGON_API_KEY");
        }

        Ok(Self {
            mode,
            feed,
            distributor,
            strategy,
        })
    }
}
