//! On-disk artifact version ledger.
//!
//! Artifact filenames carry an identity marker immediately before the
//! extension: `Acme Lead 1 (4821.v3.2).json`. Building the ledger scans one
//! folder, groups sibling files by layout id, and enforces the invariant
//! that at most one version per id survives on disk: newer files evict the
//! whole older entry, older stragglers are deleted on sight. Building over
//! an already-consistent folder deletes nothing.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use shapesync_core::types::{LayoutId, LayoutVersion};

use crate::error::{io_err, EngineError};

/// The newest artifact version found on disk for one layout id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub version: LayoutVersion,
    /// Sibling files of one logical artifact (definition, snapshot, snippet).
    pub files: Vec<PathBuf>,
}

/// In-memory index of already-produced artifacts, keyed by layout id.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: HashMap<LayoutId, LedgerEntry>,
}

impl Ledger {
    pub fn lookup(&self, id: &LayoutId) -> Option<&LedgerEntry> {
        self.entries.get(id)
    }

    /// Remove an entry, marking the id as handled for this run.
    pub fn remove(&mut self, id: &LayoutId) -> Option<LedgerEntry> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by layout id, for deterministic reporting.
    pub fn sorted(&self) -> Vec<(&LayoutId, &LedgerEntry)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0 .0.cmp(&b.0 .0));
        entries
    }
}

/// Extract `(layoutId, version)` from a filename's `(<id>.v<major>.<minor>)`
/// marker. Returns `None` for filenames without a well-formed marker.
pub fn parse_marker(file_name: &str) -> Option<(LayoutId, LayoutVersion)> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    if !stem.ends_with(')') {
        return None;
    }
    let open = stem.rfind('(')?;
    let inner = &stem[open + 1..stem.len() - 1];
    let vpos = inner.rfind(".v")?;
    let id = &inner[..vpos];
    if id.is_empty() {
        return None;
    }
    let version: LayoutVersion = inner[vpos + 2..].parse().ok()?;
    Some((LayoutId::from(id), version))
}

/// Scan the files directly under `folder` and build the ledger, deleting
/// superseded artifact files as they are discovered.
pub fn build(folder: &Path) -> Result<Ledger, EngineError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(folder)
        .map_err(|e| io_err(folder, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    // Scan order must not depend on directory enumeration order.
    paths.sort();

    let mut ledger = Ledger::default();
    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((id, version)) = parse_marker(name) else {
            continue;
        };

        match ledger.entries.entry(id) {
            Entry::Vacant(vacant) => {
                vacant.insert(LedgerEntry {
                    version,
                    files: vec![path],
                });
            }
            Entry::Occupied(mut occupied) => {
                let current = occupied.get().version;
                if version == current {
                    occupied.get_mut().files.push(path);
                } else if version > current {
                    tracing::info!(
                        "superseding {} v{current} with v{version}",
                        occupied.key()
                    );
                    delete_files(&occupied.get().files);
                    *occupied.get_mut() = LedgerEntry {
                        version,
                        files: vec![path],
                    };
                } else {
                    tracing::info!(
                        "deleting stale {} v{version} file {}",
                        occupied.key(),
                        path.display()
                    );
                    delete_files(std::slice::from_ref(&path));
                }
            }
        }
    }
    Ok(ledger)
}

/// Delete artifact files, logging failures as warnings. A failed cleanup is
/// surfaced for manual follow-up, never allowed to abort the run.
pub fn delete_files(files: &[PathBuf]) -> usize {
    let mut deleted = 0;
    for file in files {
        match std::fs::remove_file(file) {
            Ok(()) => deleted += 1,
            Err(e) => tracing::warn!("could not delete {}: {e}", file.display()),
        }
    }
    deleted
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    fn listing(dir: &Path) -> BTreeSet<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn marker_parses_id_and_version() {
        let (id, version) = parse_marker("Acme Lead 1 (4821.v3.2).json").unwrap();
        assert_eq!(id, LayoutId::from("4821"));
        assert_eq!(version, LayoutVersion::new(3, 2));
    }

    #[test]
    fn marker_rejects_malformed_names() {
        for name in [
            "plain.json",
            "no marker (4821).json",
            "bad version (4821.vx.y).json",
            "empty id (.v1.0).json",
            "trailing (4821.v1.0) extra.json",
        ] {
            assert!(parse_marker(name).is_none(), "accepted '{name}'");
        }
    }

    #[test]
    fn sibling_files_share_one_entry() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "X (100.v1.0).json");
        touch(dir.path(), "X (100.v1.0).jpg");
        touch(dir.path(), "X (100.v1.0).idms");

        let ledger = build(dir.path()).unwrap();
        let entry = ledger.lookup(&LayoutId::from("100")).unwrap();
        assert_eq!(entry.version, LayoutVersion::new(1, 0));
        assert_eq!(entry.files.len(), 3);
    }

    #[test]
    fn newer_file_evicts_whole_older_entry() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "X (100.v1.0).json");
        touch(dir.path(), "X (100.v1.0).jpg");
        touch(dir.path(), "X (100.v2.0).json");

        let ledger = build(dir.path()).unwrap();
        let entry = ledger.lookup(&LayoutId::from("100")).unwrap();
        assert_eq!(entry.version, LayoutVersion::new(2, 0));
        assert_eq!(listing(dir.path()), BTreeSet::from(["X (100.v2.0).json".to_owned()]));
    }

    #[test]
    fn older_straggler_is_deleted_on_sight() {
        let dir = TempDir::new().unwrap();
        // Sorted scan visits v0.9 after v1.0 has been recorded.
        touch(dir.path(), "A (100.v1.0).json");
        touch(dir.path(), "Z (100.v0.9).json");

        let ledger = build(dir.path()).unwrap();
        assert_eq!(
            ledger.lookup(&LayoutId::from("100")).unwrap().version,
            LayoutVersion::new(1, 0)
        );
        assert_eq!(listing(dir.path()), BTreeSet::from(["A (100.v1.0).json".to_owned()]));
    }

    #[test]
    fn minor_versions_compare_numerically() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "X (100.v2.9).json");
        touch(dir.path(), "X (100.v2.10).json");

        let ledger = build(dir.path()).unwrap();
        assert_eq!(
            ledger.lookup(&LayoutId::from("100")).unwrap().version,
            LayoutVersion::new(2, 10)
        );
        assert!(!dir.path().join("X (100.v2.9).json").exists());
    }

    #[test]
    fn build_is_idempotent_over_consistent_folder() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "X (100.v1.0).json");
        touch(dir.path(), "X (100.v1.0).jpg");
        touch(dir.path(), "Y (200.v4.1).json");
        touch(dir.path(), "unrelated.txt");

        build(dir.path()).unwrap();
        let first = listing(dir.path());
        let ledger = build(dir.path()).unwrap();
        assert_eq!(listing(dir.path()), first, "second build must delete nothing");
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn unmarked_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "X (100.v1.0).json");

        let ledger = build(dir.path()).unwrap();
        assert_eq!(ledger.len(), 1);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn remove_marks_id_as_handled() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "X (100.v1.0).json");
        let mut ledger = build(dir.path()).unwrap();
        assert!(ledger.remove(&LayoutId::from("100")).is_some());
        assert!(ledger.lookup(&LayoutId::from("100")).is_none());
        assert!(ledger.remove(&LayoutId::from("100")).is_none());
    }
}
