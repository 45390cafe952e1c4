//! # shapesync-engine
//!
//! The reconciliation core: the on-disk version ledger, the extraction
//! collaborator seam, and the engine that decides skip / re-derive / derive
//! per candidate and drives batched status transitions.
//!
//! Call [`Reconciler::run`] with a built [`WorkflowClient`](shapesync_client::WorkflowClient)
//! and an extractor to reconcile one artifact folder against the workflow
//! server's candidate query.

pub mod error;
pub mod extract;
pub mod ledger;
pub mod reconcile;

pub use error::EngineError;
pub use extract::{ExtractError, HostExtractor, ShapeExtractor};
pub use ledger::{Ledger, LedgerEntry};
pub use reconcile::{Reconciler, RunReport};
