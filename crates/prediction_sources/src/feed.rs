//! Generic JSON prediction feed.
//!
//! Sites publish predictions in whatever shape their scraper emits. The
//! feed adapter accepts the two shapes in use: a flat record with
//! `away_win_prob`/`home_win_prob`/`spread`/`total`, and the nested
//! `predictions { model_win_prob_away, ... }` layout. Both are mapped onto
//! `RawPrediction` here so nothing downstream depends on them.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{Error, RawPrediction};
use serde::Deserialize;
use tracing::debug;

use crate::PredictionSource;

/// Prediction source backed by an HTTP JSON endpoint.
#[derive(Debug, Clone)]
pub struct JsonFeedSource {
    id: String,
    url: String,
    client: reqwest::Client,
}

// ── Feed payload types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedBody {
    List(Vec<FeedRecord>),
    Wrapped { games: Vec<FeedRecord> },
}

#[derive(Debug, Default, Deserialize)]
struct FeedRecord {
    #[serde(default)]
    away_team: Option<String>,
    #[serde(default)]
    home_team: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default, alias = "model_win_prob_away")]
    away_win_prob: Option<f64>,
    #[serde(default, alias = "model_win_prob_home")]
    home_win_prob: Option<f64>,
    #[serde(default, alias = "predicted_spread")]
    spread: Option<f64>,
    #[serde(default, alias = "predicted_total")]
    total: Option<f64>,
    #[serde(default)]
    predictions: Option<NestedPredictions>,
}

#[derive(Debug, Default, Deserialize)]
struct NestedPredictions {
    #[serde(default)]
    model_win_prob_away: Option<f64>,
    #[serde(default)]
    model_win_prob_home: Option<f64>,
    #[serde(default)]
    predicted_spread: Option<f64>,
    #[serde(default)]
    predicted_total: Option<f64>,
}

// ── Implementation ────────────────────────────────────────────────────

impl JsonFeedSource {
    pub fn new(id: &str, url: &str, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent("edge-finder/0.1")
            .pool_max_idle_per_host(2)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("failed to build client for {}: {}", id, e)))?;

        Ok(Self {
            id: id.to_string(),
            url: url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl PredictionSource for JsonFeedSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, date: NaiveDate) -> Result<Vec<RawPrediction>, Error> {
        let date_key = date.format("%Y-%m-%d").to_string();
        debug!("Fetching {} predictions for {}: {}", self.id, date_key, self.url);

        let resp = self
            .client
            .get(&self.url)
            .query(&[("date", date_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable {
                source_id: self.id.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::SourceUnavailable {
                source_id: self.id.clone(),
                reason: format!(
                    "status={} body={}",
                    status.as_u16(),
                    body.chars().take(300).collect::<String>()
                ),
            });
        }

        let text = resp
            .text()
            .await
            .map_err(|e| Error::Http(format!("{} body read failed: {}", self.id, e)))?;

        parse_feed(&self.id, date, &text)
    }
}

/// Decode a feed body into predictions, dropping records without teams.
pub fn parse_feed(source: &str, date: NaiveDate, body: &str) -> Result<Vec<RawPrediction>, Error> {
    let records = match serde_json::from_str::<FeedBody>(body)? {
        FeedBody::List(records) => records,
        FeedBody::Wrapped { games } => games,
    };

    let total = records.len();
    let predictions: Vec<RawPrediction> = records
        .into_iter()
        .filter_map(|r| r.into_prediction(source, date))
        .collect();

    if predictions.len() < total {
        debug!(
            "{}: dropped {} of {} records without team names",
            source,
            total - predictions.len(),
            total
        );
    }

    Ok(predictions)
}

impl FeedRecord {
    fn into_prediction(self, source: &str, date: NaiveDate) -> Option<RawPrediction> {
        let away_team = self.away_team.filter(|s| !s.trim().is_empty())?;
        let home_team = self.home_team.filter(|s| !s.trim().is_empty())?;

        let record_date = self
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
            .unwrap_or(date);

        let nested = self.predictions.unwrap_or_default();

        Some(RawPrediction {
            source: source.to_string(),
            date: record_date,
            away_team,
            home_team,
            away_win_prob: probability(self.away_win_prob.or(nested.model_win_prob_away)),
            home_win_prob: probability(self.home_win_prob.or(nested.model_win_prob_home)),
            spread: finite(self.spread.or(nested.predicted_spread)),
            total: finite(self.total.or(nested.predicted_total)),
        })
    }
}

/// Accept probabilities as fractions or percentages.
fn probability(raw: Option<f64>) -> Option<f64> {
    let value = finite(raw)?;
    let scaled = if value > 1.0 { value / 100.0 } else { value };
    (0.0..=1.0).contains(&scaled).then_some(scaled)
}

fn finite(raw: Option<f64>) -> Option<f64> {
    raw.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn test_flat_records() {
        let body = r#"[
            {"away_team": "Duke", "home_team": "UNC", "away_win_prob": 0.41,
             "home_win_prob": 0.59, "spread": -2.5, "total": 151.0}
        ]"#;
        let preds = parse_feed("dratings", day(), body).unwrap();
        assert_eq!(preds.len(), 1);
        let p = &preds[0];
        assert_eq!(p.source, "dratings");
        assert_eq!(p.date, day());
        assert_eq!(p.away_team, "Duke");
        assert_eq!(p.home_win_prob, Some(0.59));
        assert_eq!(p.spread, Some(-2.5));
        assert_eq!(p.total, Some(151.0));
    }

    #[test]
    fn test_nested_records_and_percentages() {
        let body = r#"{"games": [
            {"away_team": "Kansas", "home_team": "Baylor", "date": "2025-03-02",
             "predictions": {"model_win_prob_away": 45.0, "model_win_prob_home": 55.0,
                             "predicted_spread": null, "predicted_total": 138.5}}
        ]}"#;
        let preds = parse_feed("cbbpy", day(), body).unwrap();
        assert_eq!(preds.len(), 1);
        let p = &preds[0];
        assert_eq!(p.date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
        assert!((p.away_win_prob.unwrap() - 0.45).abs() < 1e-12);
        assert!((p.home_win_prob.unwrap() - 0.55).abs() < 1e-12);
        assert_eq!(p.spread, None);
        assert_eq!(p.total, Some(138.5));
    }

    #[test]
    fn test_zero_spread_is_kept() {
        let body = r#"[{"away_team": "Iowa", "home_team": "Purdue", "spread": 0.0}]"#;
        let preds = parse_feed("massey", day(), body).unwrap();
        assert_eq!(preds[0].spread, Some(0.0));
    }

    #[test]
    fn test_records_without_teams_dropped() {
        let body = r#"[
            {"away_team": "", "home_team": "Gonzaga", "home_win_prob": 0.9},
            {"home_team": "Gonzaga"},
            {"away_team": "Gonzaga", "home_team": "Saint Mary's"}
        ]"#;
        let preds = parse_feed("dratings", day(), body).unwrap();
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].home_team, "Saint Mary's");
        assert_eq!(preds[0].away_win_prob, None);
    }

    #[test]
    fn test_out_of_range_probability_discarded() {
        let body = r#"[{"away_team": "A", "home_team": "B", "away_win_prob": 140.0, "home_win_prob": -0.2}]"#;
        let preds = parse_feed("dratings", day(), body).unwrap();
        assert_eq!(preds[0].away_win_prob, None);
        assert_eq!(preds[0].home_win_prob, None);
    }

    #[test]
    fn test_malformed_body_is_error() {
        let result = parse_feed("dratings", day(), "<html>blocked</html>");
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
