//! Shapesync — article-shape catalog synchronization CLI.
//!
//! # Usage
//!
//! ```text
//! shapesync init [--force]
//! shapesync login --user <name> [--server <url>] [--password <pw>]
//! shapesync logout
//! shapesync reconcile <folder>
//! shapesync ledger <folder> [--json]
//! shapesync hash <shape.json> [--canonical]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    hash::HashArgs, init::InitArgs, ledger::LedgerArgs, reconcile::ReconcileArgs,
    session::{LoginArgs, LogoutArgs},
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "shapesync",
    version,
    about = "Keep the article-shape catalog in step with the workflow server",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter config to ~/.shapesync/config.yaml.
    Init(InitArgs),

    /// Log on to the workflow server and persist the session ticket.
    Login(LoginArgs),

    /// Invalidate and delete the persisted session.
    Logout(LogoutArgs),

    /// Reconcile an artifact folder against the candidate query.
    Reconcile(ReconcileArgs),

    /// Show (and prune) the on-disk artifact version ledger for a folder.
    Ledger(LedgerArgs),

    /// Canonicalize one raw shape file and print its content hash.
    Hash(HashArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Login(args) => args.run(),
        Commands::Logout(args) => args.run(),
        Commands::Reconcile(args) => args.run(),
        Commands::Ledger(args) => args.run(),
        Commands::Hash(args) => args.run(),
    }
}
