//! The extraction collaborator seam.
//!
//! Extraction opens the source document in an external host application,
//! derives article shapes, and writes their sidecar artifact files (named
//! with the marker the ledger parses) into the target folder. The host
//! supports one foreground document at a time, which is why the engine
//! processes candidates strictly one after another.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use shapesync_core::config::ExtractorConfig;
use shapesync_core::types::LayoutCandidate;

/// Errors from one extraction attempt. Scoped to a single candidate; the
/// engine marks the candidate failed and continues.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to launch extractor '{command}': {source}")]
    Spawn {
        command: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("extractor exited with {status}: {stderr}")]
    HostFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("extractor reported an unreadable shape count: '{output}'")]
    BadCount { output: String },
}

/// Derives shapes for one candidate into `folder`, returning how many it
/// wrote.
pub trait ShapeExtractor {
    fn run(&mut self, candidate: &LayoutCandidate, folder: &Path) -> Result<usize, ExtractError>;
}

/// Production extractor: spawns the configured host-application bridge as
/// `<command> [args…] <id> <version> <folder>` and reads the shape count
/// from the last line of its stdout.
pub struct HostExtractor {
    command: PathBuf,
    args: Vec<String>,
}

impl HostExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

impl ShapeExtractor for HostExtractor {
    fn run(&mut self, candidate: &LayoutCandidate, folder: &Path) -> Result<usize, ExtractError> {
        tracing::info!(
            "extracting {} '{}' v{}",
            candidate.id,
            candidate.name,
            candidate.version
        );
        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(&candidate.id.0)
            .arg(candidate.version.to_string())
            .arg(folder)
            .output()
            .map_err(|e| ExtractError::Spawn {
                command: self.command.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ExtractError::HostFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let count_line = stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default();
        count_line
            .trim()
            .parse()
            .map_err(|_| ExtractError::BadCount {
                output: count_line.trim().to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
