//! The Odds API client.
//!
//! Fetches moneyline, spread and total prices for one sport and folds each
//! event into a `MarketLine` keyed by the feed's raw team names.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use common::config::OddsConfig;
use common::{Error, MarketLine};
use serde::Deserialize;
use tracing::debug;

use crate::{MarketLines, MarketLineSource};

/// Slate dates are US Eastern (standard time); a 9pm ET tip is the next day in UTC.
const SLATE_UTC_OFFSET_SECS: i32 = -5 * 3600;

/// The Odds API v4 client.
#[derive(Debug, Clone)]
pub struct OddsApiClient {
    client: reqwest::Client,
    config: OddsConfig,
}

// ── Odds API response types ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct OddsEvent {
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub commence_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bookmakers: Vec<OddsBookmaker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OddsBookmaker {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub markets: Vec<OddsMarket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OddsMarket {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<OddsOutcome>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OddsOutcome {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub point: Option<f64>,
}

// ── Implementation ────────────────────────────────────────────────────

impl OddsApiClient {
    pub fn new(config: OddsConfig, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("failed to build odds client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn fetch_events(&self) -> Result<Vec<OddsEvent>, Error> {
        let url = format!(
            "{}/v4/sports/{}/odds",
            self.config.base_url.trim_end_matches('/'),
            self.config.sport_key
        );
        debug!("Fetching odds: {}", url);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("regions", self.config.regions.as_str()),
                ("markets", "h2h,spreads,totals"),
                ("oddsFormat", "american"),
                ("apiKey", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("the-odds request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http(format!(
                "the-odds http status={} body={}",
                status.as_u16(),
                body.chars().take(300).collect::<String>()
            )));
        }

        resp.json()
            .await
            .map_err(|e| Error::Http(format!("the-odds decode failed: {}", e)))
    }
}

#[async_trait]
impl MarketLineSource for OddsApiClient {
    async fn fetch_odds(&self, date: NaiveDate) -> Result<MarketLines, Error> {
        let events = self.fetch_events().await?;
        Ok(lines_for_date(
            &events,
            date,
            self.config.bookmaker.as_deref(),
            &self.config.team_suffixes,
        ))
    }
}

/// Fold events commencing on `date` into market lines, keyed by team names
/// with any trailing nickname from `team_suffixes` removed.
pub fn lines_for_date(
    events: &[OddsEvent],
    date: NaiveDate,
    bookmaker: Option<&str>,
    team_suffixes: &[String],
) -> MarketLines {
    let mut lines = MarketLines::new();

    for event in events {
        if event.home_team.is_empty() || event.away_team.is_empty() {
            continue;
        }
        if let Some(start) = event.commence_time {
            if slate_date(start) != date {
                continue;
            }
        }

        let line = market_line(event, bookmaker);
        if line == MarketLine::default() {
            debug!("{} @ {}: no usable prices", event.away_team, event.home_team);
            continue;
        }
        let key = (
            strip_team_suffix(&event.away_team, team_suffixes),
            strip_team_suffix(&event.home_team, team_suffixes),
        );
        lines.insert(key, line);
    }

    lines
}

/// Remove the longest listed nickname that ends `name` as whole words
/// ("Marquette Golden Eagles" → "Marquette"). Names that are nothing but
/// a nickname are returned unchanged.
pub fn strip_team_suffix(name: &str, suffixes: &[String]) -> String {
    let trimmed = name.trim();
    let lowered = trimmed.to_ascii_lowercase();

    let best = suffixes
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && s.len() < trimmed.len())
        .filter(|s| {
            let cut = trimmed.len() - s.len();
            lowered.ends_with(&s.to_ascii_lowercase()) && trimmed[..cut].ends_with(' ')
        })
        .max_by_key(|s| s.len());

    match best {
        Some(suffix) => trimmed[..trimmed.len() - suffix.len()].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

fn slate_date(start: DateTime<Utc>) -> NaiveDate {
    match FixedOffset::east_opt(SLATE_UTC_OFFSET_SECS) {
        Some(offset) => start.with_timezone(&offset).date_naive(),
        None => start.date_naive(),
    }
}

/// Build one line, taking each market from the preferred bookmaker or,
/// when none is configured, the first bookmaker that quotes it.
fn market_line(event: &OddsEvent, bookmaker: Option<&str>) -> MarketLine {
    let find = |key: &str| -> Option<&OddsMarket> {
        event
            .bookmakers
            .iter()
            .filter(|b| bookmaker.map_or(true, |wanted| b.key == wanted))
            .find_map(|b| b.markets.iter().find(|m| m.key == key))
    };

    let mut line = MarketLine::default();

    if let Some(h2h) = find("h2h") {
        for outcome in &h2h.outcomes {
            if outcome.name == event.home_team {
                line.home_ml_odds = american(outcome.price);
            } else if outcome.name == event.away_team {
                line.away_ml_odds = american(outcome.price);
            }
        }
    }

    if let Some(spreads) = find("spreads") {
        for outcome in &spreads.outcomes {
            if outcome.name == event.home_team {
                line.spread = outcome.point.filter(|p| p.is_finite());
                line.spread_home_odds = american(outcome.price);
            } else if outcome.name == event.away_team {
                line.spread_away_odds = american(outcome.price);
            }
        }
    }

    if let Some(totals) = find("totals") {
        for outcome in &totals.outcomes {
            match outcome.name.as_str() {
                "Over" => {
                    line.total = outcome.point.filter(|p| p.is_finite());
                    line.over_odds = american(outcome.price);
                }
                "Under" => line.under_odds = american(outcome.price),
                _ => {}
            }
        }
    }

    line
}

fn american(price: f64) -> Option<i32> {
    (price.is_finite() && price.abs() >= 100.0).then(|| price.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_events() -> Vec<OddsEvent> {
        let body = r#"[
          {
            "home_team": "North Carolina Tar Heels",
            "away_team": "Duke Blue Devils",
            "commence_time": "2025-03-09T00:30:00Z",
            "bookmakers": [
              {"key": "fanduel", "markets": [
                {"key": "h2h", "outcomes": [
                  {"name": "Duke Blue Devils", "price": 125},
                  {"name": "North Carolina Tar Heels", "price": -150}
                ]}
              ]},
              {"key": "draftkings", "markets": [
                {"key": "h2h", "outcomes": [
                  {"name": "Duke Blue Devils", "price": 120},
                  {"name": "North Carolina Tar Heels", "price": -145}
                ]},
                {"key": "spreads", "outcomes": [
                  {"name": "Duke Blue Devils", "price": -110, "point": 3.5},
                  {"name": "North Carolina Tar Heels", "price": -110, "point": -3.5}
                ]},
                {"key": "totals", "outcomes": [
                  {"name": "Over", "price": -105, "point": 151.5},
                  {"name": "Under", "price": -115, "point": 151.5}
                ]}
              ]}
            ]
          },
          {
            "home_team": "Kansas Jayhawks",
            "away_team": "Houston Cougars",
            "commence_time": "2025-03-10T01:00:00Z",
            "bookmakers": []
          }
        ]"#;
        serde_json::from_str(body).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 8).unwrap()
    }

    fn suffixes() -> Vec<String> {
        OddsConfig::default().team_suffixes
    }

    #[test]
    fn test_first_bookmaker_per_market() {
        let lines = lines_for_date(&sample_events(), day(), None, &suffixes());
        assert_eq!(lines.len(), 1);

        let key = ("Duke".to_string(), "North Carolina".to_string());
        let line = &lines[&key];
        assert_eq!(line.away_ml_odds, Some(125));
        assert_eq!(line.home_ml_odds, Some(-150));
        assert_eq!(line.spread, Some(-3.5));
        assert_eq!(line.spread_home_odds, Some(-110));
        assert_eq!(line.total, Some(151.5));
        assert_eq!(line.under_odds, Some(-115));
    }

    #[test]
    fn test_preferred_bookmaker() {
        let lines = lines_for_date(&sample_events(), day(), Some("draftkings"), &suffixes());
        let key = ("Duke".to_string(), "North Carolina".to_string());
        assert_eq!(lines[&key].home_ml_odds, Some(-145));
    }

    #[test]
    fn test_evening_tip_counts_for_eastern_date() {
        // 00:30 UTC on the 9th is 7:30pm ET on the 8th.
        let lines = lines_for_date(&sample_events(), day(), None, &suffixes());
        assert!(!lines.is_empty());
        let next_day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert!(lines_for_date(&sample_events(), next_day, None, &suffixes()).is_empty());
    }

    #[test]
    fn test_nicknames_stripped_from_keys() {
        let s = suffixes();
        assert_eq!(strip_team_suffix("Duke Blue Devils", &s), "Duke");
        assert_eq!(strip_team_suffix("North Carolina Tar Heels", &s), "North Carolina");
        assert_eq!(strip_team_suffix("Marquette Golden Eagles", &s), "Marquette");
        assert_eq!(strip_team_suffix("Iowa State Cyclones", &s), "Iowa State");
        assert_eq!(strip_team_suffix("Saint Mary's Gaels", &s), "Saint Mary's");
        assert_eq!(strip_team_suffix("  kansas jayhawks ", &s), "kansas");
    }

    #[test]
    fn test_unlisted_or_bare_names_kept() {
        let s = suffixes();
        assert_eq!(strip_team_suffix("Gonzaga", &s), "Gonzaga");
        assert_eq!(strip_team_suffix("Wildcats", &s), "Wildcats");
        // Whole words only.
        assert_eq!(strip_team_suffix("Colorado Redrams", &s), "Colorado Redrams");
        assert_eq!(strip_team_suffix("Duke Blue Devils", &[]), "Duke Blue Devils");
    }

    #[test]
    fn test_invalid_prices_skipped() {
        assert_eq!(american(0.0), None);
        assert_eq!(american(50.0), None);
        assert_eq!(american(f64::NAN), None);
        assert_eq!(american(-110.0), Some(-110));
    }
}
