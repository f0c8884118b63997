//! Consensus statistics across sources.

use common::{Consensus, ConsensusStat, Metric};

use crate::matcher::MatchedGame;

/// Reduce a game's predictions to mean / population std dev / count per
/// metric. Metrics no source reported are left out, never zero-filled.
pub fn aggregate(game: &MatchedGame) -> Consensus {
    let mut consensus = Consensus::new();

    for metric in Metric::ALL {
        let values: Vec<f64> = game
            .predictions()
            .filter_map(|p| p.metric(metric))
            .filter(|v| v.is_finite())
            .collect();

        if let Some(stat) = summarize(&values) {
            consensus.insert(metric, stat);
        }
    }

    consensus
}

/// `None` for an empty sample.
pub fn summarize(values: &[f64]) -> Option<ConsensusStat> {
    if values.is_empty() {
        return None;
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std_dev = if count < 2 {
        0.0
    } else {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        variance.sqrt()
    };

    Some(ConsensusStat {
        mean,
        std_dev,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{GameMatcher, PredictionsBySource};
    use crate::teams::TeamResolver;
    use chrono::NaiveDate;
    use common::config::TeamConfig;
    use common::RawPrediction;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 8).unwrap()
    }

    fn pred(source: &str, home_prob: Option<f64>, spread: Option<f64>) -> RawPrediction {
        RawPrediction {
            source: source.into(),
            date: day(),
            away_team: "Duke".into(),
            home_team: "UNC".into(),
            away_win_prob: None,
            home_win_prob: home_prob,
            spread,
            total: None,
        }
    }

    fn game(preds: Vec<RawPrediction>) -> MatchedGame {
        let mut by_source = PredictionsBySource::new();
        for p in preds {
            by_source.insert(p.source.clone(), vec![p]);
        }
        let matcher = GameMatcher::new(
            TeamResolver::new(&TeamConfig::default()).unwrap(),
            vec!["a".into(), "b".into(), "c".into()],
        );
        matcher.match_games(day(), &by_source).remove(0)
    }

    #[test]
    fn test_population_std_dev() {
        let stat = summarize(&[0.6, 0.7]).unwrap();
        assert!((stat.mean - 0.65).abs() < 1e-12);
        assert!((stat.std_dev - 0.05).abs() < 1e-12, "std={}", stat.std_dev);
        assert_eq!(stat.count, 2);
    }

    #[test]
    fn test_single_sample_has_zero_std_dev() {
        let stat = summarize(&[-4.5]).unwrap();
        assert_eq!(stat.mean, -4.5);
        assert_eq!(stat.std_dev, 0.0);
        assert_eq!(stat.count, 1);
    }

    #[test]
    fn test_empty_sample_is_none() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn test_absent_metrics_are_omitted() {
        let g = game(vec![
            pred("a", Some(0.65), None),
            pred("b", Some(0.65), Some(-3.0)),
        ]);
        let consensus = aggregate(&g);

        assert!(!consensus.contains_key(&Metric::AwayWinProb));
        assert!(!consensus.contains_key(&Metric::Total));

        let home = consensus[&Metric::HomeWinProb];
        assert_eq!(home.count, 2);
        assert_eq!(home.std_dev, 0.0);

        let spread = consensus[&Metric::Spread];
        assert_eq!(spread.count, 1);
        assert_eq!(spread.mean, -3.0);
    }

    #[test]
    fn test_counts_follow_contributing_sources() {
        let g = game(vec![
            pred("a", Some(0.5), None),
            pred("b", None, None),
            pred("c", Some(0.7), None),
        ]);
        let consensus = aggregate(&g);
        assert_eq!(g.sources_count(), 3);
        assert_eq!(consensus[&Metric::HomeWinProb].count, 2);
        assert!((consensus[&Metric::HomeWinProb].mean - 0.6).abs() < 1e-12);
    }
}
