//! Component type label normalization.
//!
//! Brands rename standard editorial roles ("kop" for headline, "streamer"
//! for quote); the catalog hashes on the standard vocabulary so that a brand
//! rename never splits otherwise-identical shapes.

use regex::Regex;
use shapesync_core::config::LabelRule;

use crate::error::CanonError;

/// Labels the catalog understands without any mapping rule.
pub const STANDARD_LABELS: &[&str] = &[
    "headline",
    "intro",
    "body",
    "quote",
    "crosshead",
    "byline",
    "caption",
];

/// Maps a raw component type label to its standard catalog label.
pub trait LabelMapper {
    /// Returns the standard label, or [`CanonError::UnmappedLabel`] when the
    /// input denotes no known role.
    fn normalize(&self, raw: &str) -> Result<String, CanonError>;
}

/// Rule-driven mapper compiled from the config's `labels` section.
///
/// Rules are tried in order; the first full, case-insensitive match wins.
/// Raw labels that already are a standard label pass through unchanged.
#[derive(Debug)]
pub struct RegexLabelMapper {
    rules: Vec<(Regex, String)>,
}

impl RegexLabelMapper {
    pub fn from_rules(rules: &[LabelRule]) -> Result<Self, CanonError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let anchored = format!("(?i)^(?:{})$", rule.pattern);
            let regex = Regex::new(&anchored).map_err(|e| CanonError::LabelRule {
                pattern: rule.pattern.clone(),
                source: e,
            })?;
            compiled.push((regex, rule.standard.clone()));
        }
        Ok(Self { rules: compiled })
    }
}

impl LabelMapper for RegexLabelMapper {
    fn normalize(&self, raw: &str) -> Result<String, CanonError> {
        for (regex, standard) in &self.rules {
            if regex.is_match(raw) {
                return Ok(standard.clone());
            }
        }
        let lowered = raw.to_ascii_lowercase();
        if STANDARD_LABELS.contains(&lowered.as_str()) {
            return Ok(lowered);
        }
        Err(CanonError::UnmappedLabel {
            label: raw.to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
