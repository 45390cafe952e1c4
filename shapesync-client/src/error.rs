//! Error types for shapesync-client.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from workflow-server communication and session
/// handling.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or a response the protocol layer cannot decode
    /// (non-JSON body, missing envelope fields, absent required columns).
    /// Fatal; never retried here.
    #[error("workflow server communication error: {detail}")]
    Communication { detail: String },

    /// The server answered with a JSON-RPC error envelope.
    #[error("workflow server error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The paging contract is broken: processed records are not leaving the
    /// query's result set, so re-issuing the query would loop forever.
    #[error("query result set did not shrink after {pages} pages; aborting")]
    TooManyPages { pages: u32 },

    /// No persisted session; the caller must log on first.
    #[error("not logged on to the workflow server; run `shapesync login` first")]
    NoSession,

    /// An I/O error on the session file, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Session YAML serialization/deserialization error.
    #[error("session YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience constructor for [`ClientError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ClientError {
    ClientError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`ClientError::Communication`].
pub(crate) fn comm_err(detail: impl Into<String>) -> ClientError {
    ClientError::Communication {
        detail: detail.into(),
    }
}
