//! Error types for shapesync-canon.

use thiserror::Error;

/// All errors that can arise from canonicalizing one shape.
///
/// Every variant is scoped to the single shape being processed; callers
/// decide whether to fail the surrounding candidate or the whole run.
#[derive(Debug, Error)]
pub enum CanonError {
    /// The raw shape carries a field outside the closed schema, or is
    /// missing a required one. `path` names the offending location, e.g.
    /// `textComponents[1]`.
    #[error("schema violation at {path}: {detail}")]
    SchemaViolation { path: String, detail: String },

    /// A component type label matched no normalization rule and is not a
    /// standard catalog label.
    #[error("unmapped component type label '{label}'")]
    UnmappedLabel { label: String },

    /// A label rule pattern failed to compile.
    #[error("invalid label rule pattern '{pattern}': {source}")]
    LabelRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Canonical serialization failed (should not happen for well-formed
    /// canonical structs; surfaced rather than swallowed).
    #[error("canonical JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
