//! Confidence scoring and Kelly stake sizing.
//!
//! Weights and caps below are policy constants. They can be recalibrated,
//! but only here.

use common::ConsensusStat;

/// Share of confidence driven by how many sources reported the metric.
pub const SOURCE_WEIGHT: f64 = 0.6;
/// Share of confidence driven by how closely the sources agree.
pub const AGREEMENT_WEIGHT: f64 = 0.4;
/// Source count at which the source score saturates.
pub const SOURCE_SATURATION: f64 = 3.0;
/// Agreement score lost per unit of standard deviation.
pub const DISAGREEMENT_PENALTY: f64 = 4.0;
/// Hard cap on any stake, as a fraction of bankroll.
pub const MAX_STAKE_FRACTION: f64 = 0.05;

/// Confidence in [0, 100] for a consensus metric.
pub fn confidence(stat: &ConsensusStat) -> f64 {
    if stat.count == 0 {
        return 0.0;
    }

    let source_score = (stat.count as f64 / SOURCE_SATURATION).min(1.0);
    let agreement_score = if stat.std_dev.is_finite() {
        (1.0 - stat.std_dev * DISAGREEMENT_PENALTY).max(0.0)
    } else {
        0.0
    };

    ((source_score * SOURCE_WEIGHT + agreement_score * AGREEMENT_WEIGHT) * 100.0).clamp(0.0, 100.0)
}

/// Kelly stake for backing a side priced at `market_prob` that the model
/// rates at `model_prob`.
///
/// Never negative, and never above `bankroll * MAX_STAKE_FRACTION`.
pub fn kelly_stake(model_prob: f64, market_prob: f64, bankroll: f64) -> f64 {
    if !model_prob.is_finite() || !market_prob.is_finite() || !bankroll.is_finite() {
        return 0.0;
    }
    if bankroll <= 0.0 || model_prob <= 0.0 || market_prob <= 0.0 || market_prob >= 1.0 {
        return 0.0;
    }

    let fair_odds = (1.0 / market_prob) - 1.0;
    let edge = model_prob - market_prob;
    if edge <= 0.0 || fair_odds <= 0.0 {
        return 0.0;
    }

    let kelly_fraction = edge / fair_odds;
    let stake = bankroll * kelly_fraction;

    stake.min(bankroll * MAX_STAKE_FRACTION).max(0.0)
}
