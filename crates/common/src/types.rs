//! Domain types shared across the edge finder.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Source Records ────────────────────────────────────────────────────

/// One source's view of one game, as produced by a source adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    /// Source identifier (e.g. "dratings").
    pub source: String,
    pub date: NaiveDate,
    /// Away team name exactly as the source spells it.
    pub away_team: String,
    /// Home team name exactly as the source spells it.
    pub home_team: String,
    #[serde(default)]
    pub away_win_prob: Option<f64>,
    #[serde(default)]
    pub home_win_prob: Option<f64>,
    /// Predicted point spread on the home line (negative = home favored).
    #[serde(default)]
    pub spread: Option<f64>,
    /// Predicted combined points.
    #[serde(default)]
    pub total: Option<f64>,
}

impl RawPrediction {
    /// Value this record carries for `metric`, if any.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::AwayWinProb => self.away_win_prob,
            Metric::HomeWinProb => self.home_win_prob,
            Metric::Spread => self.spread,
            Metric::Total => self.total,
        }
    }
}

// ── Market Lines ──────────────────────────────────────────────────────

/// Market-implied reference for one game, from a sportsbook.
///
/// Every field is optional: a book may post a moneyline before spreads
/// and totals, or the other way around.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketLine {
    #[serde(default)]
    pub away_ml_odds: Option<i32>,
    #[serde(default)]
    pub home_ml_odds: Option<i32>,
    /// Market spread on the home line (negative = home favored).
    #[serde(default)]
    pub spread: Option<f64>,
    #[serde(default)]
    pub spread_away_odds: Option<i32>,
    #[serde(default)]
    pub spread_home_odds: Option<i32>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub over_odds: Option<i32>,
    #[serde(default)]
    pub under_odds: Option<i32>,
}

// ── Consensus ─────────────────────────────────────────────────────────

/// A predicted quantity that sources may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AwayWinProb,
    HomeWinProb,
    Spread,
    Total,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::AwayWinProb,
        Metric::HomeWinProb,
        Metric::Spread,
        Metric::Total,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwayWinProb => "away_win_prob",
            Self::HomeWinProb => "home_win_prob",
            Self::Spread => "spread",
            Self::Total => "total",
        }
    }
}

/// Summary statistics for one metric across the sources of one game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusStat {
    pub mean: f64,
    /// Population standard deviation; 0 with fewer than two samples.
    pub std_dev: f64,
    pub count: usize,
}

/// Per-metric consensus for a game. Metrics nobody reported are absent.
pub type Consensus = BTreeMap<Metric, ConsensusStat>;

// ── Edges ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    Moneyline,
    Spread,
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetSide {
    Away,
    Home,
    Over,
    Under,
}

/// A single actionable discrepancy between consensus and market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "type")]
    pub market_type: MarketType,
    /// Team backed by this side, or "Over"/"Under" for totals.
    pub team: String,
    pub side: BetSide,
    /// Market line the side is priced against (spread or total points).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<f64>,
    pub model_prob: f64,
    pub market_prob: f64,
    pub edge_percent: f64,
    /// 0–100.
    pub confidence: f64,
    /// Kelly stake in bankroll units, capped at 5% of bankroll.
    pub kelly_bet_amount: f64,
    pub recommended: bool,
}

/// Everything the caller sees for one matched game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEdgeReport {
    /// "Away @ Home" using canonical team labels.
    pub game: String,
    pub date: NaiveDate,
    pub consensus: Consensus,
    pub edges: Vec<Edge>,
    /// Largest absolute edge percentage among `edges`.
    pub max_edge: f64,
    pub sources_count: usize,
    pub sources: Vec<String>,
}

// ── Backtest ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyResult {
    pub date: NaiveDate,
    pub edges_found: usize,
    pub max_edge: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub period: String,
    pub days_scanned: usize,
    pub total_edges_found: usize,
    pub daily_results: Vec<DailyResult>,
}
