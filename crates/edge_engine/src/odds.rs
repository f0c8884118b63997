//! Odds and probability conversions.
//!
//! Implied probabilities here are vig-inclusive: the two sides of a book's
//! line sum to more than 1. They describe the price, not a fair estimate.

/// American odds → implied probability.
///
/// `None` for prices strictly between -100 and +100 (including 0), which
/// are not valid American odds.
pub fn american_to_probability(odds: i32) -> Option<f64> {
    if odds >= 100 {
        Some(100.0 / (odds as f64 + 100.0))
    } else if odds <= -100 {
        let abs = odds.unsigned_abs() as f64;
        Some(abs / (abs + 100.0))
    } else {
        None
    }
}

/// Probability → American odds, rounded to the nearest integer.
///
/// Even money is always reported as +100. `None` outside (0, 1).
pub fn probability_to_american(prob: f64) -> Option<i32> {
    if !prob.is_finite() || prob <= 0.0 || prob >= 1.0 {
        return None;
    }
    let odds = if prob > 0.5 {
        -(prob / (1.0 - prob)) * 100.0
    } else {
        (1.0 - prob) / prob * 100.0
    };
    let rounded = odds.round();
    if rounded.abs() > i32::MAX as f64 {
        return None;
    }
    Some(rounded as i32)
}

/// Edge percentage: `(model - market) / market * 100`.
///
/// Returns exactly 0 for a non-positive market probability or non-finite input.
pub fn calculate_edge(model_prob: f64, market_prob: f64) -> f64 {
    if !model_prob.is_finite() || !market_prob.is_finite() || market_prob <= 0.0 {
        return 0.0;
    }
    ((model_prob - market_prob) / market_prob) * 100.0
}

/// P(home covers `market_spread`) when the final home line is normal around
/// `model_spread`. Both spreads are on the home line (negative = home favored).
pub fn home_cover_probability(model_spread: f64, market_spread: f64, std_dev: f64) -> Option<f64> {
    if !(std_dev > 0.0) {
        return None;
    }
    Some(normal_cdf((market_spread - model_spread) / std_dev))
}

/// P(final total > `market_total`) when the total is normal around `model_total`.
pub fn over_probability(model_total: f64, market_total: f64, std_dev: f64) -> Option<f64> {
    if !(std_dev > 0.0) {
        return None;
    }
    Some(normal_cdf((model_total - market_total) / std_dev))
}

// ── Normal CDF (Abramowitz & Stegun 26.2.17) ─────────────────────────

/// Rational approximation of the standard normal CDF, max error < 7.5e-8.
pub fn normal_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return 0.5;
    }
    if z < -8.0 {
        return 0.0;
    }
    if z > 8.0 {
        return 1.0;
    }
    if z < 0.0 {
        return 1.0 - normal_cdf(-z);
    }

    const B0: f64 = 0.2316419;
    const B1: f64 = 0.319381530;
    const B2: f64 = -0.356563782;
    const B3: f64 = 1.781477937;
    const B4: f64 = -1.821255978;
    const B5: f64 = 1.330274429;

    let t = 1.0 / (1.0 + B0 * z);
    let poly = t * (B1 + t * (B2 + t * (B3 + t * (B4 + t * B5))));
    let pdf = (-0.5 * z * z).exp() / (2.0 * std::f64::consts::PI).sqrt();

    1.0 - pdf * poly
}
