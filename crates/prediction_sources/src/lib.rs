//! Source adapters for the edge finder.
//!
//! Every prediction site and odds feed sits behind one of two async traits
//! so the engine never sees per-site record shapes or network state.

pub mod feed;
pub mod odds_api;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::config::SourceConfig;
use common::{Error, MarketLine, RawPrediction};

pub use feed::JsonFeedSource;
pub use odds_api::OddsApiClient;

/// Market lines keyed by the odds feed's raw (away, home) team names.
pub type MarketLines = HashMap<(String, String), MarketLine>;

/// A source of per-game model predictions.
#[async_trait]
pub trait PredictionSource: Send + Sync {
    /// Stable identifier ("dratings", "barttorvik", ...).
    fn id(&self) -> &str;

    /// Fetch every prediction the source publishes for `date`.
    async fn fetch(&self, date: NaiveDate) -> Result<Vec<RawPrediction>, Error>;
}

/// A source of sportsbook lines.
#[async_trait]
pub trait MarketLineSource: Send + Sync {
    async fn fetch_odds(&self, date: NaiveDate) -> Result<MarketLines, Error>;
}

/// Ordered set of registered prediction sources.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn PredictionSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build JSON-feed adapters for every configured source.
    pub fn from_config(configs: &[SourceConfig], default_timeout_secs: u64) -> Result<Self, Error> {
        let mut registry = Self::new();
        for cfg in configs {
            let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(default_timeout_secs));
            let source = JsonFeedSource::new(&cfg.id, &cfg.url, timeout)?;
            registry.register(Arc::new(source))?;
        }
        Ok(registry)
    }

    /// Add a source. Identifiers must be unique.
    pub fn register(&mut self, source: Arc<dyn PredictionSource>) -> Result<(), Error> {
        if self.get(source.id()).is_some() {
            return Err(Error::Config(format!(
                "source '{}' registered twice",
                source.id()
            )));
        }
        self.sources.push(source);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn PredictionSource>> {
        self.sources.iter().find(|s| s.id() == id).cloned()
    }

    /// Source ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
