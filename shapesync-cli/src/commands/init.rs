//! `shapesync init [--force]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use shapesync_core::config::{self, Config};

/// Write a starter config to `~/.shapesync/config.yaml`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;

        let path = config::config_path_at(&home);
        if path.exists() && !self.force {
            bail!(
                "config already exists at {}; use --force to overwrite",
                path.display()
            );
        }

        config::save_at(&home, &Config::sample()).context("failed to write config")?;
        println!("✓ Wrote starter config to {}", path.display());
        println!("  Edit the server URL, query, statuses, and extractor bridge before running.");
        Ok(())
    }
}
