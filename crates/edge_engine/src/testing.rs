//! In-memory doubles for pipeline and backtest tests.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{Error, MarketLine, RawPrediction};
use prediction_sources::{MarketLineSource, MarketLines, PredictionSource};

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 8).unwrap()
}

/// A moneyline-only prediction dated [`day`].
pub fn game_pred(source: &str, away: &str, home: &str, home_win_prob: f64) -> RawPrediction {
    game_pred_on(source, day(), away, home, home_win_prob)
}

pub fn game_pred_on(
    source: &str,
    date: NaiveDate,
    away: &str,
    home: &str,
    home_win_prob: f64,
) -> RawPrediction {
    RawPrediction {
        source: source.into(),
        date,
        away_team: away.into(),
        home_team: home.into(),
        away_win_prob: None,
        home_win_prob: Some(home_win_prob),
        spread: None,
        total: None,
    }
}

pub struct StaticSource {
    id: String,
    predictions: Vec<RawPrediction>,
    delay: Option<Duration>,
    fail: bool,
}

impl StaticSource {
    pub fn new(id: &str, predictions: Vec<RawPrediction>) -> Self {
        Self {
            id: id.into(),
            predictions,
            delay: None,
            fail: false,
        }
    }

    pub fn failing(id: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(id, Vec::new())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl PredictionSource for StaticSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, date: NaiveDate) -> Result<Vec<RawPrediction>, Error> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(Error::SourceUnavailable {
                source_id: self.id.clone(),
                reason: "HTTP 503".into(),
            });
        }
        Ok(self
            .predictions
            .iter()
            .filter(|p| p.date == date)
            .cloned()
            .collect())
    }
}

pub struct StaticOdds {
    lines: MarketLines,
    fail: bool,
}

impl StaticOdds {
    pub fn new(lines: Vec<(&str, &str, MarketLine)>) -> Self {
        Self {
            lines: lines
                .into_iter()
                .map(|(away, home, line)| ((away.to_string(), home.to_string()), line))
                .collect(),
            fail: false,
        }
    }

    pub fn from_lines(lines: MarketLines) -> Self {
        Self { lines, fail: false }
    }

    pub fn failing() -> Self {
        Self {
            lines: MarketLines::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl MarketLineSource for StaticOdds {
    async fn fetch_odds(&self, _date: NaiveDate) -> Result<MarketLines, Error> {
        if self.fail {
            return Err(Error::Http("connection refused".into()));
        }
        Ok(self.lines.clone())
    }
}
