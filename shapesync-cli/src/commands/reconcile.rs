//! `shapesync reconcile <folder>` — the full synchronization run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use shapesync_canon::RegexLabelMapper;
use shapesync_client::{session, HttpTransport, WorkflowClient};
use shapesync_core::config;
use shapesync_engine::{HostExtractor, Reconciler, RunReport};

/// Arguments for `shapesync reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Folder holding the artifact files (and receiving new ones).
    pub folder: PathBuf,
}

impl ReconcileArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;

        let config = config::load_at(&home)?;
        let session = session::load_at(&home)?;

        let mapper = RegexLabelMapper::from_rules(&config.labels)
            .context("invalid label rules in config")?;
        let transport = HttpTransport::new(session.server_url.clone());
        let client = WorkflowClient::new(Box::new(transport), session.ticket.clone());
        let mut extractor = HostExtractor::new(&config.extractor);

        let mut reconciler = Reconciler::new(&client, &mut extractor, &mapper, &config);
        let report = reconciler
            .run(&session, &self.folder)
            .with_context(|| format!("reconciliation of '{}' failed", self.folder.display()))?;

        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &RunReport) {
    if report.candidates == 0 {
        println!("✓ Nothing to reconcile — candidate query is empty.");
        return;
    }

    println!(
        "✓ Reconciled {} candidate(s) across {} page(s)",
        report.candidates, report.pages
    );
    println!("  ·  {} skipped (artifacts current)", report.skipped);
    println!(
        "  ✎  {} extracted ({} shape(s) written)",
        report.extracted, report.shapes
    );
    if report.duplicate_shapes > 0 {
        println!(
            "  =  {} shape(s) duplicate existing content",
            report.duplicate_shapes
        );
    }
    if report.failed > 0 {
        println!(
            "  {}  {} failed — routed to the failure status",
            "✗".red(),
            report.failed
        );
    }
}
