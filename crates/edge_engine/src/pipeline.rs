//! End-to-end edge finding.
//!
//! Fetches every selected source and the odds feed concurrently, each under
//! its own timeout and the caller's cancellation token, then runs the
//! synchronous core (match → aggregate → evaluate → rank) over whatever
//! arrived. A failed, slow or cancelled source only removes its own
//! contribution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use common::{EdgeFinderConfig, Error, MarketLine, RankedEdgeReport, RawPrediction};
use futures::future::join_all;
use prediction_sources::{MarketLineSource, PredictionSource, SourceRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::consensus::aggregate;
use crate::evaluator::EdgeEvaluator;
use crate::matcher::{GameMatcher, MatchedGame, PredictionsBySource};
use crate::ranker::rank;
use crate::teams::{CanonicalTeam, TeamResolver};

/// Market lines re-keyed by canonical team pair.
pub type CanonicalLines = HashMap<(CanonicalTeam, CanonicalTeam), MarketLine>;

/// Which registered sources a run should query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    All,
    Only(Vec<String>),
}

impl SourceSelection {
    /// `"all"` anywhere in the list, or an empty list, selects every source.
    pub fn from_args(values: &[String]) -> Self {
        if values.is_empty() || values.iter().any(|v| v.eq_ignore_ascii_case("all")) {
            Self::All
        } else {
            Self::Only(values.to_vec())
        }
    }

    /// Expand against a registry, preserving registry order for `All`.
    pub fn resolve(&self, registry: &SourceRegistry) -> Vec<String> {
        match self {
            Self::All => registry.ids(),
            Self::Only(ids) => {
                let mut out: Vec<String> = Vec::with_capacity(ids.len());
                for id in ids {
                    if !out.contains(id) {
                        out.push(id.clone());
                    }
                }
                out
            }
        }
    }
}

/// The edge-finding pipeline.
pub struct EdgeFinder {
    registry: SourceRegistry,
    odds: Option<Arc<dyn MarketLineSource>>,
    matcher: GameMatcher,
    evaluator: EdgeEvaluator,
    source_timeout: Duration,
    source_timeouts: HashMap<String, Duration>,
    odds_timeout: Duration,
}

impl EdgeFinder {
    pub fn new(
        registry: SourceRegistry,
        odds: Option<Arc<dyn MarketLineSource>>,
        matcher: GameMatcher,
        evaluator: EdgeEvaluator,
    ) -> Self {
        Self {
            registry,
            odds,
            matcher,
            evaluator,
            source_timeout: Duration::from_secs(60),
            source_timeouts: HashMap::new(),
            odds_timeout: Duration::from_secs(30),
        }
    }

    /// Wire the core from configuration around already-built adapters.
    pub fn from_config(
        config: &EdgeFinderConfig,
        registry: SourceRegistry,
        odds: Option<Arc<dyn MarketLineSource>>,
    ) -> Result<Self, Error> {
        let resolver = TeamResolver::new(&config.teams)?;
        let matcher = GameMatcher::new(resolver, config.source_priority.clone());
        let evaluator = EdgeEvaluator::new(&config.edge);

        let source_timeouts = config
            .sources
            .iter()
            .filter_map(|s| s.timeout_secs.map(|t| (s.id.clone(), Duration::from_secs(t))))
            .collect();

        Ok(Self::new(registry, odds, matcher, evaluator)
            .with_timeouts(
                Duration::from_secs(config.timing.source_timeout_secs),
                Duration::from_secs(config.timing.odds_timeout_secs),
            )
            .with_source_timeouts(source_timeouts))
    }

    pub fn with_timeouts(mut self, source_timeout: Duration, odds_timeout: Duration) -> Self {
        self.source_timeout = source_timeout;
        self.odds_timeout = odds_timeout;
        self
    }

    pub fn with_source_timeouts(mut self, overrides: HashMap<String, Duration>) -> Self {
        self.source_timeouts = overrides;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Ranked edge reports for `date`.
    ///
    /// Never fails: unavailable sources are logged and skipped, and a run
    /// with no usable data returns an empty list.
    pub async fn find_edges(
        &self,
        date: NaiveDate,
        selection: &SourceSelection,
        min_edge_percent: f64,
        cancel: &CancellationToken,
    ) -> Vec<RankedEdgeReport> {
        let ids = selection.resolve(&self.registry);
        info!("Finding edges for {} using sources: {:?}", date, ids);

        let (predictions, lines) = tokio::join!(
            self.fetch_predictions(date, &ids, cancel),
            self.fetch_market_lines(date, cancel),
        );

        let games = self.matcher.match_games(date, &predictions);
        if games.is_empty() {
            info!("No games found for {}", date);
            return Vec::new();
        }

        let reports = self.build_reports(&games, &lines, min_edge_percent);
        info!(
            "{}: {} matched games, {} with edges",
            date,
            games.len(),
            reports.len()
        );
        reports
    }

    /// Fetch every listed source concurrently. Failures are logged and
    /// leave the source out of the returned map.
    pub async fn fetch_predictions(
        &self,
        date: NaiveDate,
        ids: &[String],
        cancel: &CancellationToken,
    ) -> PredictionsBySource {
        let mut fetches = Vec::with_capacity(ids.len());
        for id in ids {
            match self.registry.get(id) {
                Some(source) => {
                    let timeout = self
                        .source_timeouts
                        .get(id)
                        .copied()
                        .unwrap_or(self.source_timeout);
                    fetches.push(fetch_source(source, date, timeout, cancel.clone()));
                }
                None => warn!("{}", Error::UnknownSource(id.clone())),
            }
        }

        let mut predictions = PredictionsBySource::new();
        for (id, result) in join_all(fetches).await {
            match result {
                Ok(records) if records.is_empty() => {
                    info!("{}: no predictions for {}", id, date);
                }
                Ok(records) => {
                    debug!("{}: {} predictions", id, records.len());
                    predictions.insert(id, records);
                }
                Err(e) => warn!("{}: proceeding without source ({})", id, e),
            }
        }
        predictions
    }

    /// Market lines for `date`, keyed by canonical team pair. Empty when no
    /// odds feed is configured or the feed fails.
    pub async fn fetch_market_lines(&self, date: NaiveDate, cancel: &CancellationToken) -> CanonicalLines {
        let Some(odds) = self.odds.as_ref() else {
            debug!("No odds feed configured; no market lines");
            return CanonicalLines::new();
        };

        let fetched = tokio::select! {
            biased;
            outcome = tokio::time::timeout(self.odds_timeout, odds.fetch_odds(date)) => match outcome {
                Ok(result) => result,
                Err(_) => Err(Error::SourceTimeout {
                    source_id: "odds".into(),
                    timeout_ms: self.odds_timeout.as_millis() as u64,
                }),
            },
            _ = cancel.cancelled() => Err(Error::Cancelled),
        };

        let raw = match fetched {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Market lines unavailable for {}: {}", date, e);
                return CanonicalLines::new();
            }
        };

        let resolver = self.matcher.resolver();
        let mut lines = CanonicalLines::new();
        for ((away, home), line) in raw {
            let key = (resolver.resolve(&away), resolver.resolve(&home));
            if lines.contains_key(&key) {
                debug!("Duplicate market line for {} @ {}; keeping first", away, home);
                continue;
            }
            lines.insert(key, line);
        }
        lines
    }

    /// Synchronous core over already-fetched data.
    pub fn build_reports(
        &self,
        games: &[MatchedGame],
        lines: &CanonicalLines,
        min_edge_percent: f64,
    ) -> Vec<RankedEdgeReport> {
        let mut reports = Vec::new();

        for game in games {
            let consensus = aggregate(game);
            let Some(line) = lines.get(&(game.away.clone(), game.home.clone())) else {
                debug!("{}: no market line", game.label());
                continue;
            };

            let edges = self.evaluator.evaluate(
                game.away.label(),
                game.home.label(),
                &consensus,
                line,
                min_edge_percent,
            );
            if edges.is_empty() {
                continue;
            }

            let max_edge = edges
                .iter()
                .map(|e| e.edge_percent.abs())
                .fold(0.0_f64, f64::max);

            reports.push(RankedEdgeReport {
                game: game.label(),
                date: game.date,
                consensus,
                edges,
                max_edge,
                sources_count: game.sources_count(),
                sources: game.source_ids(),
            });
        }

        rank(reports)
    }
}

async fn fetch_source(
    source: Arc<dyn PredictionSource>,
    date: NaiveDate,
    timeout: Duration,
    cancel: CancellationToken,
) -> (String, Result<Vec<RawPrediction>, Error>) {
    let id = source.id().to_string();

    let result = tokio::select! {
        biased;
        outcome = tokio::time::timeout(timeout, source.fetch(date)) => match outcome {
            Ok(result) => result,
            Err(_) => Err(Error::SourceTimeout {
                source_id: id.clone(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        },
        _ = cancel.cancelled() => Err(Error::Cancelled),
    };

    (id, result)
}
