//! # shapesync-client
//!
//! Workflow-server client: JSON-RPC-over-HTTP transport, tabular
//! `Columns`/`Rows` query decoding, bounded re-query pagination, batched
//! status transitions, and the persisted login session.
//!
//! The server is the system of record; this crate never retries a call. A
//! query page may trigger status side effects elsewhere in the fleet, so a
//! malformed response is surfaced as a fatal [`ClientError::Communication`]
//! rather than silently re-issued.

pub mod client;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use client::{QueryPage, StatusDef, WorkflowClient, MAX_QUERY_PAGES};
pub use error::ClientError;
pub use protocol::{RowSet, SearchParam};
pub use session::Session;
pub use transport::{HttpTransport, Transport};
