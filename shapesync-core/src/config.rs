//! The shapesync configuration document.
//!
//! # Storage layout
//!
//! ```text
//! ~/.shapesync/
//!   config.yaml    (server, query, statuses, label rules, extractor bridge)
//!   session.yaml   (owned by shapesync-client)
//! ```
//!
//! # API pattern
//!
//! Every function that touches the filesystem has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// Workflow-server status names a reconciled document is routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNames {
    /// Status for documents whose shapes are up to date (skipped or freshly
    /// extracted with at least one usable shape).
    pub success: String,
    /// Status for documents that yielded no usable shape.
    pub failure: String,
}

/// One brand-configurable label normalization rule.
///
/// `pattern` is a full-match, case-insensitive regular expression over the
/// raw component type label; `standard` is the catalog label it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    pub pattern: String,
    pub standard: String,
}

/// The external host-application bridge that performs shape extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Command invoked as `<command> [args…] <id> <version> <folder>`.
    pub command: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Root of `~/.shapesync/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Workflow server JSON-RPC endpoint, e.g. `https://workflow.example.com/index.php`.
    pub server_url: String,
    /// Named query on the server that lists extraction candidates.
    pub query: String,
    /// Page size requested per query call.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Optional publication filter appended to the query's search params.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication: Option<String>,
    pub statuses: StatusNames,
    #[serde(default)]
    pub labels: Vec<LabelRule>,
    pub extractor: ExtractorConfig,
}

fn default_page_size() -> u32 {
    50
}

impl Config {
    /// A starter config written by `shapesync init`; every field is meant to
    /// be edited before the first run.
    pub fn sample() -> Self {
        Self {
            server_url: "https://workflow.example.com/index.php".to_owned(),
            query: "Article Shape Candidates".to_owned(),
            page_size: default_page_size(),
            publication: None,
            statuses: StatusNames {
                success: "Shape Extracted".to_owned(),
                failure: "Shape Extraction Failed".to_owned(),
            },
            labels: vec![LabelRule {
                pattern: "head(line)?".to_owned(),
                standard: "headline".to_owned(),
            }],
            extractor: ExtractorConfig {
                command: PathBuf::from("/usr/local/bin/shape-bridge"),
                args: vec![],
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.shapesync/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".shapesync").join("config.yaml")
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load the config from `<home>/.shapesync/config.yaml`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with
/// path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

/// Save the config atomically (`.tmp` + rename), creating `~/.shapesync/`
/// if needed.
pub fn save_at(home: &Path, config: &Config) -> Result<(), ConfigError> {
    let path = config_path_at(home);
    let Some(dir) = path.parent() else {
        return Err(ConfigError::Io(std::io::Error::other(
            "invalid config path",
        )));
    };
    std::fs::create_dir_all(dir)?;

    let yaml = serde_yaml::to_string(config)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    save_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
