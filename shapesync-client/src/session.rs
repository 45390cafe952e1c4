//! Persisted login session.
//!
//! `~/.shapesync/session.yaml` holds the ticket issued by `LogOn` together
//! with the named queries the server advertised for this user. The engine's
//! preconditions (session exists, configured query is known) both read from
//! this document.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, ClientError};

/// One authenticated workflow-server session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub server_url: String,
    pub user: String,
    pub ticket: String,
    /// Named queries the server advertised in its LogOn response.
    #[serde(default)]
    pub named_queries: Vec<String>,
    pub logged_in_at: DateTime<Utc>,
}

/// `<home>/.shapesync/session.yaml` — pure, no I/O.
pub fn session_path_at(home: &Path) -> PathBuf {
    home.join(".shapesync").join("session.yaml")
}

/// Load the persisted session; [`ClientError::NoSession`] if none exists.
pub fn load_at(home: &Path) -> Result<Session, ClientError> {
    let path = session_path_at(home);
    if !path.exists() {
        return Err(ClientError::NoSession);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Save the session atomically (`.tmp` + rename).
pub fn save_at(home: &Path, session: &Session) -> Result<(), ClientError> {
    let path = session_path_at(home);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid session path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let yaml = serde_yaml::to_string(session)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// Delete the persisted session; missing file is not an error.
pub fn delete_at(home: &Path) -> Result<(), ClientError> {
    let path = session_path_at(home);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(&path, e)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
