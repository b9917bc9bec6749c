pub mod normalize;

use crate::error::{Result, ScheduleError};
use once_cell::sync::Lazy;
use regex::Regex;

pub use normalize::{collapse_whitespace, local_start, parse_timestamp, truncate_chars};

static VS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(.+?)\s+vs\.?\s+(.+?)(?:\s|$)").unwrap());
static AT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.+?)\s+@\s+(.+?)(?:\s|$)").unwrap());

/// Home and away sides read from free text. Either may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Teams {
    pub home: String,
    pub away: String,
}

impl Teams {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            away: away.into(),
        }
    }

    /// `"home vs away"` when both sides are known.
    pub fn title(&self) -> Option<String> {
        if self.home.is_empty() || self.away.is_empty() {
            None
        } else {
            Some(format!("{} vs {}", self.home, self.away))
        }
    }
}

/// Reads `"A vs B"` (A at home) or `"A @ B"` (A visiting B). The first
/// pattern that matches wins.
pub fn parse_teams(text: &str) -> Teams {
    if let Some(caps) = VS_REGEX.captures(text) {
        return Teams::new(caps[1].trim(), caps[2].trim());
    }
    if let Some(caps) = AT_REGEX.captures(text) {
        return Teams::new(caps[2].trim(), caps[1].trim());
    }
    Teams::default()
}

/// Decides whether a row or record belongs to the configured team.
#[derive(Debug, Clone)]
pub struct TeamFilter {
    pattern: Regex,
    short_key: String,
}

impl TeamFilter {
    pub fn new(team: &str) -> Result<Self> {
        let words: Vec<&str> = team.split_whitespace().collect();
        if words.is_empty() {
            return Err(ScheduleError::Other("team name is empty".to_string()));
        }

        let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
        let pattern = Regex::new(&format!(r"(?i){}", escaped.join(r"\s*")))
            .map_err(|e| ScheduleError::Selector(e.to_string()))?;

        // JSON records are matched on the leading two words ("la surf")
        let short_key = words
            .iter()
            .take(2)
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self { pattern, short_key })
    }

    pub fn short_key(&self) -> &str {
        &self.short_key
    }

    /// Case-insensitive match on rendered row text, tolerant of spacing.
    pub fn matches_text(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Matches the space-joined, lowercased home and away names.
    pub fn matches_pair(&self, home: &str, away: &str) -> bool {
        format!("{} {}", home, away)
            .to_lowercase()
            .contains(&self.short_key)
    }
}

#[derive(Debug, Clone)]
pub struct AgeGroupFilter {
    token: Regex,
    strict: bool,
}

impl AgeGroupFilter {
    pub fn new(age_group: &str, strict: bool) -> Result<Self> {
        let token = Regex::new(&format!(r"(?i){}", regex::escape(age_group.trim())))
            .map_err(|e| ScheduleError::Selector(e.to_string()))?;
        Ok(Self { token, strict })
    }

    pub fn mentions(&self, text: &str) -> bool {
        self.token.is_match(text)
    }

    /// Lenient filters let every row through; the page filter click is
    /// trusted to have narrowed the list already.
    pub fn accepts(&self, text: &str) -> bool {
        !self.strict || self.mentions(text)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }
}
