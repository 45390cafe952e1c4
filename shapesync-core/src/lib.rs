//! # shapesync-core
//!
//! Domain types and configuration for the shapesync workspace: layout
//! identity and versioning, query candidates, reconciliation outcomes, and
//! the YAML configuration document under `~/.shapesync/`.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::ConfigError;
