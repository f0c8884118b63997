//! Edge finder configuration types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeFinderConfig {
    /// Registered prediction sources, in "all" expansion order.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,

    /// Anchor priority: the first listed source with games for the date
    /// seeds the matched-game set.
    #[serde(default = "default_source_priority")]
    pub source_priority: Vec<String>,

    /// Team-name normalization and alias table.
    #[serde(default)]
    pub teams: TeamConfig,

    /// Edge thresholds and stake sizing.
    #[serde(default)]
    pub edge: EdgeConfig,

    /// Fetch timeouts (seconds).
    #[serde(default)]
    pub timing: TimingConfig,

    /// Market odds feed.
    #[serde(default)]
    pub odds: OddsConfig,
}

/// One registered prediction source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Stable identifier used in CLI selection and reports.
    pub id: String,
    /// JSON feed URL; the date is passed as `?date=YYYY-MM-DD`.
    pub url: String,
    /// Per-source override of `timing.source_timeout_secs`.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Team identity normalization rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Institutional filler removed from raw names before lookup.
    #[serde(default = "default_filler_phrases")]
    pub filler_phrases: Vec<String>,

    /// Canonical label → known raw spellings. Merged onto the built-in
    /// table unless `builtin_aliases` is false.
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,

    #[serde(default = "default_true")]
    pub builtin_aliases: bool,
}

impl TeamConfig {
    /// Effective alias table: built-in entries (when enabled) extended by
    /// the configured ones. Variants listed under an existing label are
    /// appended to it.
    pub fn alias_table(&self) -> BTreeMap<String, Vec<String>> {
        let mut table = if self.builtin_aliases {
            default_aliases()
        } else {
            BTreeMap::new()
        };
        for (canonical, variants) in &self.aliases {
            let entry = table.entry(canonical.clone()).or_default();
            for variant in variants {
                if !entry.contains(variant) {
                    entry.push(variant.clone());
                }
            }
        }
        table
    }
}

/// Edge detection and sizing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Minimum absolute edge percentage for a side to be reported.
    #[serde(default = "default_min_edge_percent")]
    pub min_edge_percent: f64,

    /// Bankroll used for Kelly stake sizing.
    #[serde(default = "default_bankroll")]
    pub bankroll: f64,

    /// Standard deviation of the final home margin around the predicted spread (points).
    #[serde(default = "default_spread_std_dev")]
    pub spread_std_dev: f64,

    /// Standard deviation of the final combined score around the predicted total (points).
    #[serde(default = "default_total_std_dev")]
    pub total_std_dev: f64,
}

/// Timing configuration (all values in seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_source_timeout")]
    pub source_timeout_secs: u64,

    #[serde(default = "default_odds_timeout")]
    pub odds_timeout_secs: u64,
}

/// The Odds API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsConfig {
    /// API key; empty disables market lines (no edges are produced).
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_odds_base_url")]
    pub base_url: String,

    #[serde(default = "default_sport_key")]
    pub sport_key: String,

    #[serde(default = "default_regions")]
    pub regions: String,

    /// Preferred bookmaker key (e.g. "draftkings"); first available when unset.
    #[serde(default)]
    pub bookmaker: Option<String>,

    /// Nicknames the feed appends to school names ("Duke Blue Devils").
    /// Stripped from the end of each team name before lines are keyed.
    #[serde(default = "default_team_suffixes")]
    pub team_suffixes: Vec<String>,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_min_edge_percent() -> f64 {
    2.0
}
fn default_bankroll() -> f64 {
    1000.0
}
fn default_spread_std_dev() -> f64 {
    11.0
}
fn default_total_std_dev() -> f64 {
    17.0
}
fn default_source_timeout() -> u64 {
    60
}
fn default_odds_timeout() -> u64 {
    30
}
fn default_odds_base_url() -> String {
    "https://api.the-odds-api.com".into()
}
fn default_sport_key() -> String {
    "basketball_ncaab".into()
}
fn default_regions() -> String {
    "us".into()
}

fn default_true() -> bool {
    true
}

fn default_team_suffixes() -> Vec<String> {
    [
        "Aggies", "Aztecs", "Badgers", "Bearcats", "Bears", "Beavers", "Billikens", "Blue Demons",
        "Blue Devils", "Bluejays", "Boilermakers", "Broncos", "Bruins", "Buckeyes", "Bulldogs",
        "Bulls", "Cardinal", "Cardinals", "Cavaliers", "Chanticleers", "Commodores", "Cornhuskers",
        "Cougars", "Cowboys", "Crimson Tide", "Cyclones", "Demon Deacons", "Ducks", "Dukes", "Eagles",
        "Fighting Illini", "Fighting Irish", "Flyers", "Friars", "Gaels", "Gamecocks", "Gators",
        "Golden Bears", "Golden Eagles", "Golden Gophers", "Hawkeyes", "Hokies", "Hoosiers",
        "Horned Frogs", "Huskies", "Jayhawks", "Knights", "Lobos", "Longhorns", "Mountaineers",
        "Musketeers", "Mustangs", "Nittany Lions", "Owls", "Panthers", "Pirates", "Rams",
        "Razorbacks", "Rebels", "Red Raiders", "Red Storm", "RedHawks", "Scarlet Knights",
        "Seminoles", "Shockers", "Spartans", "Sun Devils", "Tar Heels", "Terrapins", "Tigers",
        "Trojans", "Utes", "Volunteers", "Wildcats", "Wolf Pack", "Wolfpack", "Wolverines",
        "Yellow Jackets",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_sources() -> Vec<SourceConfig> {
    Vec::new()
}

fn default_source_priority() -> Vec<String> {
    vec!["dratings".into(), "cbbpy".into(), "barttorvik".into()]
}

fn default_filler_phrases() -> Vec<String> {
    vec!["University of ".into(), " University".into(), "College".into()]
}

fn default_aliases() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 10] = [
        ("North Carolina", &["UNC"]),
        ("Connecticut", &["UConn"]),
        ("Arizona State", &["ASU", "Arizona St", "Arizona St."]),
        ("NC State", &["North Carolina State", "North Carolina St", "N.C. State"]),
        ("Mississippi", &["Ole Miss"]),
        ("Pittsburgh", &["Pitt"]),
        ("Southern California", &["USC"]),
        ("Virginia Commonwealth", &["VCU"]),
        ("Brigham Young", &["BYU"]),
        ("Saint Mary's", &["St. Mary's", "Saint Mary's (CA)"]),
    ];
    table
        .iter()
        .map(|(canonical, variants)| {
            (
                canonical.to_string(),
                variants.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect()
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            filler_phrases: default_filler_phrases(),
            aliases: BTreeMap::new(),
            builtin_aliases: true,
        }
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            min_edge_percent: default_min_edge_percent(),
            bankroll: default_bankroll(),
            spread_std_dev: default_spread_std_dev(),
            total_std_dev: default_total_std_dev(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            source_timeout_secs: default_source_timeout(),
            odds_timeout_secs: default_odds_timeout(),
        }
    }
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_odds_base_url(),
            sport_key: default_sport_key(),
            regions: default_regions(),
            bookmaker: None,
            team_suffixes: default_team_suffixes(),
        }
    }
}

impl Default for EdgeFinderConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            source_priority: default_source_priority(),
            teams: TeamConfig::default(),
            edge: EdgeConfig::default(),
            timing: TimingConfig::default(),
            odds: OddsConfig::default(),
        }
    }
}
