//! Prediction aggregation and edge finding.
//!
//! Raw per-source predictions flow through team resolution, anchor-based
//! game matching, consensus aggregation and edge evaluation against market
//! lines, and come out as ranked per-game reports. Everything except
//! [`pipeline`] and [`backtest`] is synchronous and pure.

pub mod backtest;
pub mod consensus;
pub mod evaluator;
pub mod matcher;
pub mod odds;
pub mod pipeline;
pub mod ranker;
pub mod scoring;
pub mod teams;

#[cfg(test)]
mod testing;

pub use backtest::backtest;
pub use consensus::aggregate;
pub use evaluator::EdgeEvaluator;
pub use matcher::{GameMatcher, MatchedGame, PredictionsBySource};
pub use odds::{american_to_probability, calculate_edge, probability_to_american};
pub use pipeline::{EdgeFinder, SourceSelection};
pub use ranker::rank;
pub use teams::{CanonicalTeam, TeamResolver};
