//! `shapesync ledger <folder>` — artifact version ledger visibility.
//!
//! Building the ledger enforces the one-version-per-id invariant, so this
//! command doubles as a manual pruning pass over a folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use tabled::{settings::Style, Table, Tabled};

use shapesync_engine::ledger;

/// Arguments for `shapesync ledger`.
#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Folder holding the artifact files.
    pub folder: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct LedgerRow {
    #[tabled(rename = "layout id")]
    layout_id: String,
    #[tabled(rename = "version")]
    version: String,
    #[tabled(rename = "files")]
    files: usize,
}

impl LedgerArgs {
    pub fn run(self) -> Result<()> {
        let ledger = ledger::build(&self.folder)
            .with_context(|| format!("failed to scan '{}'", self.folder.display()))?;

        if self.json {
            let entries: Vec<_> = ledger
                .sorted()
                .into_iter()
                .map(|(id, entry)| {
                    json!({
                        "layoutId": id.0,
                        "version": entry.version.to_string(),
                        "files": entry.files,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        if ledger.is_empty() {
            println!("No artifacts found in '{}'.", self.folder.display());
            return Ok(());
        }

        let rows: Vec<LedgerRow> = ledger
            .sorted()
            .into_iter()
            .map(|(id, entry)| LedgerRow {
                layout_id: id.to_string(),
                version: entry.version.to_string(),
                files: entry.files.len(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
