//! Error types for shapesync-engine.

use std::path::PathBuf;

use thiserror::Error;

use shapesync_client::ClientError;

/// Fatal errors that abort a reconciliation run.
///
/// Per-candidate failures (extractor errors, schema violations in one
/// shape) are NOT here — they are logged, counted in the run report, and
/// the run continues.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad or missing settings: unknown named query, unresolved status
    /// names, success and failure configured identically. Raised before any
    /// side effect.
    #[error("configuration error: {detail}")]
    Configuration { detail: String },

    /// A workflow-server failure: no session, malformed response, paging
    /// ceiling tripped.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`EngineError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`EngineError::Configuration`].
pub(crate) fn config_err(detail: impl Into<String>) -> EngineError {
    EngineError::Configuration {
        detail: detail.into(),
    }
}
