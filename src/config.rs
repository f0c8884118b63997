//! Configuration loader: merges config.toml, .env and environment overrides.

use std::collections::HashSet;
use std::path::PathBuf;

use common::{EdgeFinderConfig, Error};

fn parse_non_negative_f64(raw: &str, env_name: &str) -> Result<f64, Error> {
    let parsed = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::Config(format!("{env_name} must be a number >= 0")))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(Error::Config(format!("{env_name} must be a number >= 0")));
    }
    Ok(parsed)
}

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn config_path() -> PathBuf {
    match std::env::var("EDGE_CONFIG_PATH") {
        Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw.trim()),
        _ => PathBuf::from("config.toml"),
    }
}

pub fn validate_config(config: &EdgeFinderConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.source_priority.is_empty() {
        issues.push("source_priority must contain at least one source".into());
    }

    let mut seen = HashSet::new();
    for source in &config.sources {
        if source.id.trim().is_empty() {
            issues.push("sources[].id must not be empty".into());
        } else if source.id.eq_ignore_ascii_case("all") {
            issues.push("sources[].id 'all' is reserved".into());
        } else if !seen.insert(source.id.as_str()) {
            issues.push(format!("sources[].id '{}' is declared twice", source.id));
        }
        if source.url.trim().is_empty() {
            issues.push(format!("sources.{}.url must not be empty", source.id));
        }
        if source.timeout_secs == Some(0) {
            issues.push(format!("sources.{}.timeout_secs must be > 0", source.id));
        }
    }

    if !(config.edge.min_edge_percent >= 0.0) {
        issues.push("edge.min_edge_percent must be >= 0".into());
    }
    if !(config.edge.bankroll > 0.0) || !config.edge.bankroll.is_finite() {
        issues.push("edge.bankroll must be > 0".into());
    }
    if !(config.edge.spread_std_dev > 0.0) {
        issues.push("edge.spread_std_dev must be > 0".into());
    }
    if !(config.edge.total_std_dev > 0.0) {
        issues.push("edge.total_std_dev must be > 0".into());
    }

    if config.timing.source_timeout_secs == 0 {
        issues.push("timing.source_timeout_secs must be > 0".into());
    }
    if config.timing.odds_timeout_secs == 0 {
        issues.push("timing.odds_timeout_secs must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load configuration from an optional config file and the environment.
pub fn load_config() -> Result<EdgeFinderConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = EdgeFinderConfig::default();

    // 3. Try loading config.toml if it exists.
    let path = config_path();
    if path.exists() {
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    } else {
        tracing::debug!("{} not found; using defaults", path.display());
    }

    // 4. Override with environment variables (highest priority).
    if let Ok(key) = std::env::var("ODDS_API_KEY") {
        config.odds.api_key = key.trim().to_string();
    }
    if let Ok(raw) = std::env::var("EDGE_MIN_EDGE_PERCENT") {
        config.edge.min_edge_percent = parse_non_negative_f64(&raw, "EDGE_MIN_EDGE_PERCENT")?;
    }
    if let Ok(raw) = std::env::var("EDGE_BANKROLL") {
        config.edge.bankroll = parse_non_negative_f64(&raw, "EDGE_BANKROLL")?;
    }
    if let Ok(raw) = std::env::var("EDGE_SOURCE_TIMEOUT_SECS") {
        config.timing.source_timeout_secs = parse_positive_u64(&raw, "EDGE_SOURCE_TIMEOUT_SECS")?;
    }
    if let Ok(raw) = std::env::var("EDGE_ODDS_TIMEOUT_SECS") {
        config.timing.odds_timeout_secs = parse_positive_u64(&raw, "EDGE_ODDS_TIMEOUT_SECS")?;
    }

    // 5. Validate.
    validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::config::SourceConfig;

    fn source(id: &str) -> SourceConfig {
        SourceConfig {
            id: id.into(),
            url: format!("https://example.test/{id}"),
            timeout_secs: None,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        validate_config(&EdgeFinderConfig::default()).unwrap();
    }

    #[test]
    fn test_issues_are_collected() {
        let mut config = EdgeFinderConfig::default();
        config.source_priority.clear();
        config.edge.bankroll = 0.0;
        config.edge.min_edge_percent = -1.0;
        config.timing.odds_timeout_secs = 0;

        let msg = validate_config(&config).unwrap_err().to_string();
        assert!(msg.contains("source_priority"), "{}", msg);
        assert!(msg.contains("edge.bankroll"), "{}", msg);
        assert!(msg.contains("edge.min_edge_percent"), "{}", msg);
        assert!(msg.contains("timing.odds_timeout_secs"), "{}", msg);
    }

    #[test]
    fn test_duplicate_and_reserved_source_ids() {
        let mut config = EdgeFinderConfig::default();
        config.sources = vec![source("dratings"), source("dratings"), source("all")];
        let msg = validate_config(&config).unwrap_err().to_string();
        assert!(msg.contains("declared twice"), "{}", msg);
        assert!(msg.contains("reserved"), "{}", msg);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config: EdgeFinderConfig = toml::from_str(
            r#"
            source_priority = ["barttorvik"]

            [[sources]]
            id = "barttorvik"
            url = "https://example.test/torvik"
            timeout_secs = 15

            [edge]
            min_edge_percent = 4.5

            [teams.aliases]
            "Saint Peter's" = ["St. Peter's"]
            "#,
        )
        .unwrap();

        assert_eq!(config.source_priority, vec!["barttorvik"]);
        assert_eq!(config.sources[0].timeout_secs, Some(15));
        assert_eq!(config.edge.min_edge_percent, 4.5);
        assert_eq!(config.edge.bankroll, 1000.0);
        assert_eq!(config.timing.source_timeout_secs, 60);
        let aliases = config.teams.alias_table();
        assert!(aliases.contains_key("Saint Peter's"));
        assert!(aliases.contains_key("North Carolina"));
        assert!(aliases.contains_key("Connecticut"));
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_toml_can_replace_builtin_aliases() {
        let config: EdgeFinderConfig = toml::from_str(
            r#"
            [teams]
            builtin_aliases = false

            [teams.aliases]
            "Saint Peter's" = ["St. Peter's"]
            "#,
        )
        .unwrap();

        let aliases = config.teams.alias_table();
        assert_eq!(aliases.len(), 1);
        assert!(!aliases.contains_key("North Carolina"));
    }

    #[test]
    fn test_env_number_parsing() {
        assert_eq!(parse_non_negative_f64(" 3.5 ", "X").unwrap(), 3.5);
        assert!(parse_non_negative_f64("-1", "X").is_err());
        assert!(parse_non_negative_f64("abc", "X").is_err());
        assert_eq!(parse_positive_u64("20", "X").unwrap(), 20);
        assert!(parse_positive_u64("0", "X").is_err());
    }
}
