//! Reconciliation engine.
//!
//! Per candidate: `Queried → {Skipped | Extracted | Failed} → StatusPosted`.
//! Skips are the idempotence guarantee that keeps repeated runs cheap; every
//! candidate ends in a status post so the re-query result set shrinks and
//! the pagination contract holds (a permanently broken document lands on
//! the failure status instead of spinning the query until the page ceiling
//! trips).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use shapesync_canon::{self as canon, ContentHash, LabelMapper};
use shapesync_client::{Session, WorkflowClient};
use shapesync_core::config::Config;
use shapesync_core::types::{LayoutCandidate, LayoutId, Outcome};

use crate::error::{config_err, EngineError};
use crate::extract::ShapeExtractor;
use crate::ledger::{self, Ledger};

/// Totals for one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Non-empty query pages processed.
    pub pages: u32,
    pub candidates: usize,
    pub skipped: usize,
    pub extracted: usize,
    /// Candidates that produced nothing usable (zero shapes or extractor
    /// failure).
    pub failed: usize,
    /// Usable shapes hashed across all extractions.
    pub shapes: usize,
    /// Shapes whose content hash matched an earlier shape this run.
    pub duplicate_shapes: usize,
}

/// Resolved status ids for one publication.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StatusPair {
    success: String,
    failure: String,
}

/// Drives one reconciliation run against one artifact folder.
pub struct Reconciler<'a> {
    client: &'a WorkflowClient,
    extractor: &'a mut dyn ShapeExtractor,
    mapper: &'a dyn LabelMapper,
    config: &'a Config,
    /// Per-publication status ids, resolved once.
    status_cache: HashMap<String, StatusPair>,
    /// Content hashes seen this run, for duplicate detection.
    seen_hashes: HashSet<ContentHash>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        client: &'a WorkflowClient,
        extractor: &'a mut dyn ShapeExtractor,
        mapper: &'a dyn LabelMapper,
        config: &'a Config,
    ) -> Self {
        Self {
            client,
            extractor,
            mapper,
            config,
            status_cache: HashMap::new(),
            seen_hashes: HashSet::new(),
        }
    }

    /// Reconcile `folder` against the configured candidate query.
    pub fn run(&mut self, session: &Session, folder: &Path) -> Result<RunReport, EngineError> {
        if session.ticket.is_empty() {
            return Err(shapesync_client::ClientError::NoSession.into());
        }
        if !session.named_queries.iter().any(|q| q == &self.config.query) {
            return Err(config_err(format!(
                "named query '{}' is not defined on the server",
                self.config.query
            )));
        }

        let mut ledger = ledger::build(folder)?;
        tracing::info!(
            "ledger built over {}: {} artifact id(s)",
            folder.display(),
            ledger.len()
        );

        let params = match &self.config.publication {
            Some(publication) => vec![shapesync_client::SearchParam::equals(
                "PublicationId",
                publication.clone(),
            )],
            None => vec![],
        };

        let mut report = RunReport::default();
        // The closure borrows `self` mutably, so copy the client handle and
        // query settings out first.
        let client = self.client;
        let query = self.config.query.clone();
        let page_size = self.config.page_size;
        let pages = client.query_all(&query, &params, page_size, |candidates| {
            self.process_page(&mut ledger, folder, candidates, &mut report)
        })?;
        report.pages = pages;

        tracing::info!(
            "run complete: {} page(s), {} skipped, {} extracted, {} failed",
            report.pages,
            report.skipped,
            report.extracted,
            report.failed
        );
        Ok(report)
    }

    fn process_page(
        &mut self,
        ledger: &mut Ledger,
        folder: &Path,
        candidates: Vec<LayoutCandidate>,
        report: &mut RunReport,
    ) -> Result<(), EngineError> {
        // Batches grouped by resolved status id: one post per distinct id,
        // which is exactly one success and one failure call on
        // single-publication pages.
        let mut to_success: BTreeMap<String, Vec<LayoutId>> = BTreeMap::new();
        let mut to_failure: BTreeMap<String, Vec<LayoutId>> = BTreeMap::new();

        for candidate in candidates {
            let statuses = self.resolve_statuses(&candidate.publication_id)?;
            let outcome = self.reconcile_candidate(ledger, folder, &candidate, report);

            report.candidates += 1;
            match outcome {
                Outcome::Skipped => {
                    report.skipped += 1;
                    to_success.entry(statuses.success).or_default().push(candidate.id);
                }
                Outcome::Extracted(count) if count > 0 => {
                    report.extracted += 1;
                    report.shapes += count;
                    to_success.entry(statuses.success).or_default().push(candidate.id);
                }
                Outcome::Extracted(_) | Outcome::Failed => {
                    report.failed += 1;
                    to_failure.entry(statuses.failure).or_default().push(candidate.id);
                }
            }
        }

        for (status_id, ids) in &to_success {
            self.client.set_status(ids, status_id)?;
        }
        for (status_id, ids) in &to_failure {
            self.client.set_status(ids, status_id)?;
        }
        Ok(())
    }

    /// Decide skip / purge-and-extract / extract for one candidate.
    ///
    /// Never fails the run: extractor and canonicalization errors degrade to
    /// `Failed` / a reduced shape count.
    fn reconcile_candidate(
        &mut self,
        ledger: &mut Ledger,
        folder: &Path,
        candidate: &LayoutCandidate,
        report: &mut RunReport,
    ) -> Outcome {
        // Removing the entry marks the id as handled for this run, so a
        // duplicate appearing on a later page extracts instead of double-
        // purging — by then its files carry the candidate version.
        match ledger.remove(&candidate.id) {
            Some(entry) if entry.version == candidate.version => {
                tracing::debug!(
                    "skipping {}: artifacts at v{} are current",
                    candidate.id,
                    entry.version
                );
                return Outcome::Skipped;
            }
            Some(entry) => {
                tracing::info!(
                    "{}: disk has v{}, server has v{}; purging {} file(s)",
                    candidate.id,
                    entry.version,
                    candidate.version,
                    entry.files.len()
                );
                ledger::delete_files(&entry.files);
            }
            None => {}
        }

        match self.extractor.run(candidate, folder) {
            Ok(reported) => {
                let usable = self.hash_new_shapes(candidate, folder, reported, report);
                Outcome::Extracted(usable)
            }
            Err(e) => {
                tracing::warn!("extraction failed for {}: {e}", candidate.id);
                Outcome::Failed
            }
        }
    }

    /// Canonicalize and hash the `.json` sidecars the extractor just wrote
    /// for this candidate. Returns the usable shape count; shapes that fail
    /// canonicalization are logged and excluded.
    fn hash_new_shapes(
        &mut self,
        candidate: &LayoutCandidate,
        folder: &Path,
        reported: usize,
        report: &mut RunReport,
    ) -> usize {
        let mut sidecars = match sidecar_shapes(candidate, folder) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!("cannot list shapes for {}: {e}", candidate.id);
                return 0;
            }
        };
        sidecars.sort();

        let mut usable = 0;
        for path in sidecars {
            let raw = match std::fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(e) => {
                    tracing::warn!("cannot read shape {}: {e}", path.display());
                    continue;
                }
            };
            let raw: serde_json::Value = match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("shape {} is not valid JSON: {e}", path.display());
                    continue;
                }
            };
            match canon::hash_shape(&raw, self.mapper) {
                Ok(hash) => {
                    if !self.seen_hashes.insert(hash.clone()) {
                        tracing::info!(
                            "duplicate shape content {} ({})",
                            hash,
                            path.display()
                        );
                        report.duplicate_shapes += 1;
                    }
                    usable += 1;
                }
                Err(e) => {
                    tracing::warn!("shape {} rejected: {e}", path.display());
                }
            }
        }
        if usable != reported {
            tracing::debug!(
                "{}: extractor reported {reported} shape(s), {usable} usable",
                candidate.id
            );
        }
        usable
    }

    fn resolve_statuses(&mut self, publication_id: &str) -> Result<StatusPair, EngineError> {
        if let Some(pair) = self.status_cache.get(publication_id) {
            return Ok(pair.clone());
        }

        let statuses = self.client.publication_statuses(publication_id)?;
        let resolve = |name: &str| {
            statuses
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.id.clone())
                .ok_or_else(|| {
                    config_err(format!(
                        "status '{name}' is not defined for publication {publication_id}"
                    ))
                })
        };
        let pair = StatusPair {
            success: resolve(&self.config.statuses.success)?,
            failure: resolve(&self.config.statuses.failure)?,
        };
        if pair.success == pair.failure {
            return Err(config_err(format!(
                "success and failure statuses both resolve to id {} for publication {publication_id}",
                pair.success
            )));
        }
        self.status_cache
            .insert(publication_id.to_owned(), pair.clone());
        Ok(pair)
    }
}

/// The `.json` sidecars in `folder` whose marker matches this candidate's
/// id and version.
fn sidecar_shapes(
    candidate: &LayoutCandidate,
    folder: &Path,
) -> Result<Vec<std::path::PathBuf>, std::io::Error> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((id, version)) = ledger::parse_marker(name) {
            if id == candidate.id && version == candidate.version {
                paths.push(path);
            }
        }
    }
    Ok(paths)
}
