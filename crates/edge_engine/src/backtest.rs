//! Date-range scan over the edge pipeline.

use chrono::NaiveDate;
use common::{BacktestSummary, DailyResult, Error};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::pipeline::{EdgeFinder, SourceSelection};

/// Run [`EdgeFinder::find_edges`] for every date in `start..=end`.
///
/// A cancelled token stops the scan after the current day; the days already
/// scanned are still summarized.
pub async fn backtest(
    finder: &EdgeFinder,
    start: NaiveDate,
    end: NaiveDate,
    selection: &SourceSelection,
    min_edge_percent: f64,
    cancel: &CancellationToken,
) -> Result<BacktestSummary, Error> {
    if start > end {
        return Err(Error::Config(format!(
            "backtest start {} is after end {}",
            start, end
        )));
    }

    info!("Backtesting from {} to {}", start, end);

    let mut daily_results = Vec::new();
    for date in start.iter_days().take_while(|d| *d <= end) {
        if cancel.is_cancelled() {
            warn!("Backtest cancelled before {}", date);
            break;
        }

        let reports = finder
            .find_edges(date, selection, min_edge_percent, cancel)
            .await;
        let max_edge = reports.iter().map(|r| r.max_edge).fold(0.0_f64, f64::max);

        daily_results.push(DailyResult {
            date,
            edges_found: reports.len(),
            max_edge,
        });
    }

    let total_edges_found = daily_results.iter().map(|d| d.edges_found).sum();
    info!(
        "Backtest complete: {} days, {} games with edges",
        daily_results.len(),
        total_edges_found
    );

    Ok(BacktestSummary {
        period: format!("{} to {}", start, end),
        days_scanned: daily_results.len(),
        total_edges_found,
        daily_results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use common::config::EdgeFinderConfig;
    use common::MarketLine;
    use prediction_sources::{MarketLineSource, SourceRegistry};

    use crate::testing::{game_pred_on, StaticOdds, StaticSource};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn finder() -> EdgeFinder {
        let mut registry = SourceRegistry::new();
        registry
            .register(Arc::new(StaticSource::new(
                "dratings",
                vec![
                    game_pred_on("dratings", date(1), "Duke", "UNC", 0.65),
                    game_pred_on("dratings", date(3), "Duke", "UNC", 0.65),
                    game_pred_on("dratings", date(3), "Iowa", "Purdue", 0.80),
                ],
            )))
            .unwrap();
        let odds = StaticOdds::new(vec![
            (
                "Duke",
                "North Carolina",
                MarketLine {
                    home_ml_odds: Some(-150),
                    ..Default::default()
                },
            ),
            (
                "Iowa",
                "Purdue",
                MarketLine {
                    home_ml_odds: Some(-150),
                    ..Default::default()
                },
            ),
        ]);
        EdgeFinder::from_config(
            &EdgeFinderConfig::default(),
            registry,
            Some(Arc::new(odds) as Arc<dyn MarketLineSource>),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_scans_every_day_inclusive() {
        let summary = backtest(
            &finder(),
            date(1),
            date(3),
            &SourceSelection::All,
            2.0,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.period, "2025-03-01 to 2025-03-03");
        assert_eq!(summary.days_scanned, 3);
        assert_eq!(summary.total_edges_found, 3);

        let counts: Vec<_> = summary.daily_results.iter().map(|d| d.edges_found).collect();
        assert_eq!(counts, vec![1, 0, 2]);
        assert_eq!(summary.daily_results[1].max_edge, 0.0);
        assert!(
            (summary.daily_results[2].max_edge - 100.0 / 3.0).abs() < 1e-6,
            "max_edge={}",
            summary.daily_results[2].max_edge
        );
    }

    #[tokio::test]
    async fn test_single_day_range() {
        let summary = backtest(
            &finder(),
            date(1),
            date(1),
            &SourceSelection::All,
            2.0,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(summary.days_scanned, 1);
        assert_eq!(summary.total_edges_found, 1);
    }

    #[tokio::test]
    async fn test_start_after_end_is_rejected() {
        let err = backtest(
            &finder(),
            date(3),
            date(1),
            &SourceSelection::All,
            2.0,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_cancelled_scan_stops_early() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let summary = backtest(&finder(), date(1), date(3), &SourceSelection::All, 2.0, &cancel)
            .await
            .unwrap();
        assert_eq!(summary.days_scanned, 0);
        assert!(summary.daily_results.is_empty());
    }
}
