//! `shapesync hash <shape.json>` — canonicalize one raw shape and print its
//! content hash. Lets an operator check whether two exported shapes would
//! collapse to one catalog entry.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use shapesync_canon::{canonical, RegexLabelMapper};
use shapesync_core::{config, ConfigError};

/// Arguments for `shapesync hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Raw shape JSON file (an extractor `.json` sidecar).
    pub file: PathBuf,

    /// Also print the canonical JSON the hash covers.
    #[arg(long)]
    pub canonical: bool,
}

impl HashArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;

        // Label rules come from the config; without one, only the standard
        // vocabulary is accepted.
        let labels = match config::load_at(&home) {
            Ok(config) => config.labels,
            Err(ConfigError::NotFound { .. }) => vec![],
            Err(e) => return Err(e.into()),
        };
        let mapper = RegexLabelMapper::from_rules(&labels).context("invalid label rules")?;

        let contents = std::fs::read_to_string(&self.file)
            .with_context(|| format!("cannot read '{}'", self.file.display()))?;
        let raw: serde_json::Value = serde_json::from_str(&contents)
            .with_context(|| format!("'{}' is not valid JSON", self.file.display()))?;

        let shape = canonical::canonicalize(&raw, &mapper)
            .with_context(|| format!("'{}' is not a valid shape", self.file.display()))?;
        let hash = canonical::hash(&shape)?;

        if self.canonical {
            println!("{}", serde_json::to_string_pretty(&shape)?);
        }
        println!("{hash}");
        Ok(())
    }
}
