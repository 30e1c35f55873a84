//! Recently used hosts.
//!
//! The interactive menu lists the last few hosts above the clients for quick
//! access. [`RecentHosts`] is loaded once when the menu starts, updated in
//! memory as actions run, and written back when the menu exits. Entries are
//! qualified `client:name` tokens so they stay unambiguous.
//!
//! The file is a JSON array of strings. A missing or corrupt file is treated
//! as empty; history is a convenience and never blocks the tool.

use crate::error::Result;
use std::path::PathBuf;
use tracing::{debug, warn};

/// How many hosts are remembered.
pub const MAX_RECENT: usize = 5;

/// File name inside the config directory.
pub const HISTORY_FILE: &str = "history.json";

/// Most-recent-first list of qualified host tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentHosts {
    path: PathBuf,
    entries: Vec<String>,
    dirty: bool,
}

impl RecentHosts {
    /// Load history from `path`, starting empty if it is missing or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Vec<String>>(&text) {
                Ok(mut entries) => {
                    entries.truncate(MAX_RECENT);
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring corrupt history file");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read history file");
                Vec::new()
            }
        };
        debug!(count = entries.len(), "loaded recent hosts");

        Self {
            path,
            entries,
            dirty: false,
        }
    }

    /// Qualified host tokens, most recent first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Move `token` to the front, dropping the oldest entry past [`MAX_RECENT`].
    pub fn record(&mut self, token: &str) {
        self.entries.retain(|e| e != token);
        self.entries.insert(0, token.to_string());
        self.entries.truncate(MAX_RECENT);
        self.dirty = true;
    }

    /// Write the list back if it changed.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string(&self.entries)?;
        std::fs::write(&self.path, body)?;
        self.dirty = false;
        debug!(path = %self.path.display(), "saved recent hosts");
        Ok(())
    }
}
