//! Edge evaluation: consensus model vs. market price, side by side.
//!
//! A side is evaluated only when both its consensus metric and its market
//! price are present. Nothing is estimated from partial data.

use common::config::EdgeConfig;
use common::{BetSide, Consensus, ConsensusStat, Edge, Error, MarketLine, MarketType, Metric};
use tracing::debug;

use crate::odds::{american_to_probability, calculate_edge, home_cover_probability, over_probability};
use crate::scoring::{confidence, kelly_stake};

/// Compares consensus probabilities against market-implied ones.
#[derive(Debug, Clone)]
pub struct EdgeEvaluator {
    bankroll: f64,
    spread_std_dev: f64,
    total_std_dev: f64,
}

/// One priced side awaiting the threshold check.
struct Candidate<'a> {
    market_type: MarketType,
    side: BetSide,
    team: String,
    line: Option<f64>,
    model_prob: f64,
    odds: Option<i32>,
    stat: &'a ConsensusStat,
}

impl EdgeEvaluator {
    pub fn new(config: &EdgeConfig) -> Self {
        Self {
            bankroll: config.bankroll,
            spread_std_dev: config.spread_std_dev,
            total_std_dev: config.total_std_dev,
        }
    }

    pub fn bankroll(&self) -> f64 {
        self.bankroll
    }

    /// Edges for one game whose absolute edge is at least `min_edge_percent`.
    ///
    /// Sides are emitted in a fixed order: away and home moneyline, away and
    /// home spread, over and under.
    pub fn evaluate(
        &self,
        away: &str,
        home: &str,
        consensus: &Consensus,
        market: &MarketLine,
        min_edge_percent: f64,
    ) -> Vec<Edge> {
        let mut candidates: Vec<Candidate<'_>> = Vec::new();

        if let Some(stat) = consensus.get(&Metric::AwayWinProb) {
            candidates.push(Candidate {
                market_type: MarketType::Moneyline,
                side: BetSide::Away,
                team: away.to_string(),
                line: None,
                model_prob: stat.mean,
                odds: market.away_ml_odds,
                stat,
            });
        }
        if let Some(stat) = consensus.get(&Metric::HomeWinProb) {
            candidates.push(Candidate {
                market_type: MarketType::Moneyline,
                side: BetSide::Home,
                team: home.to_string(),
                line: None,
                model_prob: stat.mean,
                odds: market.home_ml_odds,
                stat,
            });
        }

        if let (Some(stat), Some(market_spread)) = (consensus.get(&Metric::Spread), market.spread) {
            if let Some(p_home) = home_cover_probability(stat.mean, market_spread, self.spread_std_dev) {
                candidates.push(Candidate {
                    market_type: MarketType::Spread,
                    side: BetSide::Away,
                    team: away.to_string(),
                    line: Some(-market_spread),
                    model_prob: 1.0 - p_home,
                    odds: market.spread_away_odds,
                    stat,
                });
                candidates.push(Candidate {
                    market_type: MarketType::Spread,
                    side: BetSide::Home,
                    team: home.to_string(),
                    line: Some(market_spread),
                    model_prob: p_home,
                    odds: market.spread_home_odds,
                    stat,
                });
            }
        }

        if let (Some(stat), Some(market_total)) = (consensus.get(&Metric::Total), market.total) {
            if let Some(p_over) = over_probability(stat.mean, market_total, self.total_std_dev) {
                candidates.push(Candidate {
                    market_type: MarketType::Total,
                    side: BetSide::Over,
                    team: "Over".into(),
                    line: Some(market_total),
                    model_prob: p_over,
                    odds: market.over_odds,
                    stat,
                });
                candidates.push(Candidate {
                    market_type: MarketType::Total,
                    side: BetSide::Under,
                    team: "Under".into(),
                    line: Some(market_total),
                    model_prob: 1.0 - p_over,
                    odds: market.under_odds,
                    stat,
                });
            }
        }

        candidates
            .into_iter()
            .filter_map(|c| self.price(c, min_edge_percent))
            .collect()
    }

    fn price(&self, candidate: Candidate<'_>, min_edge_percent: f64) -> Option<Edge> {
        let odds = candidate.odds?;
        let Some(market_prob) = american_to_probability(odds) else {
            let err = Error::InvalidMarketLine(format!(
                "{} {:?} priced at {}",
                candidate.team, candidate.market_type, odds
            ));
            debug!("{}; side skipped", err);
            return None;
        };
        if !candidate.model_prob.is_finite() {
            return None;
        }

        let edge_percent = calculate_edge(candidate.model_prob, market_prob);
        if edge_percent.abs() < min_edge_percent {
            return None;
        }

        Some(Edge {
            market_type: candidate.market_type,
            team: candidate.team,
            side: candidate.side,
            line: candidate.line,
            model_prob: candidate.model_prob,
            market_prob,
            edge_percent,
            confidence: confidence(candidate.stat),
            kelly_bet_amount: kelly_stake(candidate.model_prob, market_prob, self.bankroll),
            recommended: edge_percent > 0.0,
        })
    }
}
