//! Team identity resolution.
//!
//! Every source spells teams its own way ("UNC", "North Carolina",
//! "University of North Carolina"). Resolution is a pure function of the
//! raw string: trim, strip institutional filler, fold case, then look the
//! result up in the alias table. Unknown names map to themselves.
//!
//! There is no fuzzy matching. Two spellings of the same team that are
//! missing from the alias table stay distinct; merging two different
//! teams is the worse failure.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use common::config::TeamConfig;
use common::Error;

/// Stable identity for a team. Equality and hashing use the folded key only.
#[derive(Debug, Clone)]
pub struct CanonicalTeam {
    key: String,
    label: String,
}

impl CanonicalTeam {
    /// Case-folded, whitespace-collapsed identity key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display name: the alias table's canonical label, or the normalized input.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for CanonicalTeam {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for CanonicalTeam {}

impl Hash for CanonicalTeam {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for CanonicalTeam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Maps raw team names onto canonical identities.
#[derive(Debug, Clone)]
pub struct TeamResolver {
    fillers: Vec<String>,
    /// Folded variant key → canonical label.
    aliases: HashMap<String, String>,
}

impl TeamResolver {
    /// Build a resolver, rejecting alias tables where one spelling points
    /// at two different teams.
    pub fn new(config: &TeamConfig) -> Result<Self, Error> {
        let fillers: Vec<String> = config
            .filler_phrases
            .iter()
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect();

        let mut resolver = Self {
            fillers,
            aliases: HashMap::new(),
        };

        let mut issues: Vec<String> = Vec::new();
        for (canonical, variants) in &config.alias_table() {
            let label = collapse_whitespace(canonical);
            if label.is_empty() {
                issues.push("alias table has an empty canonical label".into());
                continue;
            }
            for spelling in std::iter::once(canonical).chain(variants.iter()) {
                let key = fold(&resolver.normalize(spelling));
                if key.is_empty() {
                    issues.push(format!("alias '{}' for {} normalizes to nothing", spelling, label));
                    continue;
                }
                match resolver.aliases.get(&key) {
                    Some(existing) if *existing != label => issues.push(format!(
                        "alias '{}' maps to both '{}' and '{}'",
                        spelling, existing, label
                    )),
                    Some(_) => {}
                    None => {
                        resolver.aliases.insert(key, label.clone());
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(resolver)
        } else {
            Err(Error::Config(format!(
                "Invalid team aliases:\n - {}",
                issues.join("\n - ")
            )))
        }
    }

    /// Resolve a raw name. Never fails.
    pub fn resolve(&self, raw: &str) -> CanonicalTeam {
        let normalized = self.normalize(raw);
        let key = fold(&normalized);

        match self.aliases.get(&key) {
            Some(label) => CanonicalTeam {
                key: fold(label),
                label: label.clone(),
            },
            None => CanonicalTeam {
                key,
                label: normalized,
            },
        }
    }

    /// Trim and strip filler phrases. Falls back to the trimmed input when
    /// stripping would leave nothing (e.g. a team literally named "College").
    fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let mut name = trimmed.to_string();
        for phrase in &self.fillers {
            name = remove_phrase(&name, phrase);
        }
        let collapsed = collapse_whitespace(&name);
        if collapsed.is_empty() {
            collapse_whitespace(trimmed)
        } else {
            collapsed
        }
    }
}

/// ASCII case-insensitive removal of every occurrence of `phrase`.
fn remove_phrase(haystack: &str, phrase: &str) -> String {
    let lower_hay = haystack.to_ascii_lowercase();
    let lower_phrase = phrase.to_ascii_lowercase();

    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0;
    while let Some(found) = lower_hay[cursor..].find(&lower_phrase) {
        let start = cursor + found;
        out.push_str(&haystack[cursor..start]);
        out.push(' ');
        cursor = start + lower_phrase.len();
    }
    out.push_str(&haystack[cursor..]);
    out
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold(input: &str) -> String {
    collapse_whitespace(input).to_lowercase()
}
