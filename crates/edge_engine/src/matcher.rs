//! Cross-source game matching.
//!
//! One source is chosen as the anchor and seeds the set of games; every
//! other source can only attach predictions to games the anchor already
//! has. Games the anchor missed are invisible to the rest of the pipeline.
//!
//! Matching is exact on (date, canonical away, canonical home). A source
//! that lists the same two teams with home and away swapped does not
//! match; the record is dropped and logged at debug level.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use common::RawPrediction;
use tracing::debug;

use crate::teams::{CanonicalTeam, TeamResolver};

/// Predictions grouped by source id.
pub type PredictionsBySource = BTreeMap<String, Vec<RawPrediction>>;

/// One real-world game and every source's prediction for it.
#[derive(Debug, Clone)]
pub struct MatchedGame {
    pub date: NaiveDate,
    pub away: CanonicalTeam,
    pub home: CanonicalTeam,
    /// Source the game was seeded from.
    pub anchor: String,
    predictions: BTreeMap<String, RawPrediction>,
}

impl MatchedGame {
    fn new(date: NaiveDate, away: CanonicalTeam, home: CanonicalTeam, anchor: RawPrediction) -> Self {
        let anchor_id = anchor.source.clone();
        let mut predictions = BTreeMap::new();
        predictions.insert(anchor_id.clone(), anchor);
        Self {
            date,
            away,
            home,
            anchor: anchor_id,
            predictions,
        }
    }

    /// "Away @ Home" with canonical labels.
    pub fn label(&self) -> String {
        format!("{} @ {}", self.away, self.home)
    }

    pub fn predictions(&self) -> impl Iterator<Item = &RawPrediction> {
        self.predictions.values()
    }

    pub fn prediction(&self, source: &str) -> Option<&RawPrediction> {
        self.predictions.get(source)
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.predictions.keys().cloned().collect()
    }

    pub fn sources_count(&self) -> usize {
        self.predictions.len()
    }

    /// Attach a prediction; a source contributes at most once per game.
    fn merge(&mut self, prediction: RawPrediction) -> bool {
        if self.predictions.contains_key(&prediction.source) {
            return false;
        }
        self.predictions.insert(prediction.source.clone(), prediction);
        true
    }
}

/// Groups per-source predictions into matched games.
#[derive(Debug, Clone)]
pub struct GameMatcher {
    resolver: TeamResolver,
    priority: Vec<String>,
}

impl GameMatcher {
    /// `priority` is the anchor order; sources not listed are tried
    /// afterwards in lexical order.
    pub fn new(resolver: TeamResolver, priority: Vec<String>) -> Self {
        Self { resolver, priority }
    }

    pub fn resolver(&self) -> &TeamResolver {
        &self.resolver
    }

    /// First source, in priority order, with at least one record for `date`.
    pub fn anchor_source(&self, date: NaiveDate, predictions: &PredictionsBySource) -> Option<String> {
        let has_games = |id: &str| {
            predictions
                .get(id)
                .is_some_and(|records| records.iter().any(|r| r.date == date))
        };

        self.priority
            .iter()
            .map(String::as_str)
            .chain(
                predictions
                    .keys()
                    .map(String::as_str)
                    .filter(|id| !self.priority.iter().any(|p| p == id)),
            )
            .find(|id| has_games(id))
            .map(str::to_string)
    }

    /// Build matched games for `date`. Returns an empty set when no source
    /// has games for the date.
    pub fn match_games(&self, date: NaiveDate, predictions: &PredictionsBySource) -> Vec<MatchedGame> {
        let Some(anchor) = self.anchor_source(date, predictions) else {
            debug!("No source has games for {}", date);
            return Vec::new();
        };

        let mut games: Vec<MatchedGame> = Vec::new();
        let mut index: HashMap<(CanonicalTeam, CanonicalTeam), usize> = HashMap::new();

        for record in predictions.get(&anchor).into_iter().flatten() {
            if record.date != date {
                continue;
            }
            let key = self.key_for(record);
            if index.contains_key(&key) {
                debug!(
                    "{}: duplicate game {} @ {} ignored",
                    anchor, record.away_team, record.home_team
                );
                continue;
            }
            let mut stamped = record.clone();
            stamped.source = anchor.clone();
            index.insert(key.clone(), games.len());
            games.push(MatchedGame::new(date, key.0, key.1, stamped));
        }

        for (source, records) in predictions {
            if *source == anchor {
                continue;
            }

            let mut merged = 0usize;
            let mut dropped = 0usize;
            for record in records.iter().filter(|r| r.date == date) {
                let (away, home) = self.key_for(record);
                let slot = index.get(&(away.clone(), home.clone())).copied();
                match slot {
                    Some(i) => {
                        let mut stamped = record.clone();
                        stamped.source = source.clone();
                        if games[i].merge(stamped) {
                            merged += 1;
                        } else {
                            debug!("{}: second record for {} ignored", source, games[i].label());
                        }
                    }
                    None => {
                        if index.contains_key(&(home.clone(), away.clone())) {
                            debug!(
                                "{}: {} @ {} has home/away swapped relative to {}; not merged",
                                source, away, home, anchor
                            );
                        }
                        dropped += 1;
                    }
                }
            }

            debug!(
                "{}: merged {} records, {} without an anchor game",
                source, merged, dropped
            );
        }

        games
    }

    fn key_for(&self, record: &RawPrediction) -> (CanonicalTeam, CanonicalTeam) {
        (
            self.resolver.resolve(&record.away_team),
            self.resolver.resolve(&record.home_team),
        )
    }
}
