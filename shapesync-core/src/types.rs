//! Domain types for layout reconciliation.
//!
//! Versions are always the structured [`LayoutVersion`] pair; raw
//! `"major.minor"` strings exist only at the parse boundary (query rows and
//! artifact filenames), never at comparison sites.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque, stable identifier of a source layout document in the workflow
/// server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutId(pub String);

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for LayoutId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LayoutId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// A layout document version, monotonically increasing per [`LayoutId`].
///
/// Ordering is component-wise numeric: major first, then minor. `"2.10"`
/// sorts after `"2.9"`, which string comparison would get wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayoutVersion {
    pub major: u32,
    pub minor: u32,
}

impl LayoutVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for LayoutVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for LayoutVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s.split_once('.').ok_or_else(|| VersionParseError {
            raw: s.to_owned(),
        })?;
        let parse = |part: &str| {
            part.parse::<u32>().map_err(|_| VersionParseError {
                raw: s.to_owned(),
            })
        };
        Ok(Self {
            major: parse(major)?,
            minor: parse(minor)?,
        })
    }
}

/// A version string that is not of the form `<major>.<minor>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid layout version '{raw}'; expected '<major>.<minor>'")]
pub struct VersionParseError {
    pub raw: String,
}

// ---------------------------------------------------------------------------
// Candidates and outcomes
// ---------------------------------------------------------------------------

/// One layout document as reported by a workflow-server query page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutCandidate {
    pub id: LayoutId,
    pub version: LayoutVersion,
    pub name: String,
    pub publication_id: String,
}

/// Per-candidate result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Artifacts on disk already match the candidate's version; nothing ran.
    Skipped,
    /// Extraction ran and produced this many usable shapes. Zero means the
    /// document yielded nothing and is routed to the failure status.
    Extracted(usize),
    /// The extractor itself failed for this candidate.
    Failed,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn version_display_roundtrip() {
        let v: LayoutVersion = "3.2".parse().unwrap();
        assert_eq!(v, LayoutVersion::new(3, 2));
        assert_eq!(v.to_string(), "3.2");
    }

    #[rstest]
    #[case("")]
    #[case("3")]
    #[case("3.")]
    #[case(".2")]
    #[case("3.2.1")]
    #[case("a.b")]
    #[case("-1.2")]
    fn version_rejects_malformed(#[case] raw: &str) {
        assert!(raw.parse::<LayoutVersion>().is_err(), "accepted '{raw}'");
    }

    #[test]
    fn version_ordering_is_numeric_not_lexicographic() {
        let v2_9: LayoutVersion = "2.9".parse().unwrap();
        let v2_10: LayoutVersion = "2.10".parse().unwrap();
        let v10_0: LayoutVersion = "10.0".parse().unwrap();
        assert!(v2_10 > v2_9);
        assert!(v10_0 > v2_10);
    }

    #[test]
    fn layout_id_display() {
        assert_eq!(LayoutId::from("4821").to_string(), "4821");
    }
}
