//! `shapesync login` / `shapesync logout` — workflow-server session handling.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use shapesync_client::{session, HttpTransport, Session, WorkflowClient};
use shapesync_core::config;

/// Arguments for `shapesync login`.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Workflow server user name.
    #[arg(long, short = 'u')]
    pub user: String,

    /// Server URL (defaults to the configured `server_url`).
    #[arg(long)]
    pub server: Option<String>,

    /// Password (falls back to $SHAPESYNC_PASSWORD).
    #[arg(long)]
    pub password: Option<String>,
}

impl LoginArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;

        let config = config::load_at(&home).context("login needs a config for the server URL")?;
        let server_url = self.server.unwrap_or_else(|| config.server_url.clone());
        let password = match self.password {
            Some(password) => password,
            None => std::env::var("SHAPESYNC_PASSWORD")
                .context("provide --password or set $SHAPESYNC_PASSWORD")?,
        };

        let transport = HttpTransport::new(server_url.clone());
        let (ticket, named_queries) = WorkflowClient::log_on(&transport, &self.user, &password)
            .with_context(|| format!("log on to {server_url} failed"))?;

        if !named_queries.iter().any(|q| q == &config.query) {
            eprintln!(
                "{} the server did not advertise the configured query '{}'",
                "warning:".yellow(),
                config.query
            );
        }

        let session = Session {
            server_url,
            user: self.user,
            ticket,
            named_queries,
            logged_in_at: Utc::now(),
        };
        session::save_at(&home, &session).context("failed to persist session")?;
        println!(
            "✓ Logged on as '{}' ({} named quer{} advertised)",
            session.user,
            session.named_queries.len(),
            if session.named_queries.len() == 1 { "y" } else { "ies" },
        );
        Ok(())
    }
}

/// Arguments for `shapesync logout`.
#[derive(Args, Debug)]
pub struct LogoutArgs {}

impl LogoutArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;

        match session::load_at(&home) {
            Ok(session) => {
                let transport = HttpTransport::new(session.server_url.clone());
                let client = WorkflowClient::new(Box::new(transport), session.ticket.clone());
                // Best effort: the local session is deleted even if the
                // server-side log off fails.
                if let Err(e) = client.log_off() {
                    eprintln!("{} server log off failed: {e}", "warning:".yellow());
                }
                session::delete_at(&home)?;
                println!("✓ Logged off '{}'", session.user);
            }
            Err(shapesync_client::ClientError::NoSession) => {
                println!("No session to log off.");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}
