//! Error types for ops-launcher.
//!
//! All errors are represented by [`OpsError`], which covers inventory loading,
//! host resolution, action building and local process failures. Anything that
//! can be detected before a child process starts is reported here; a remote
//! command's own failure is surfaced as its exit status instead.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    /// Configuration, resolution or build failure before any child process starts.
    pub const CONFIG: i32 = 2;
    pub const COMMAND_NOT_FOUND: i32 = 127;
}

/// A single field-level problem found while validating the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted path to the offending field, e.g. `clients.acme.hosts[0].port`.
    pub path: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every validation problem in an inventory, collected in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub issues: Vec<ConfigIssue>,
}

impl ConfigError {
    /// Whether any issue points at exactly `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.issues.iter().any(|i| i.path == path)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid inventory ({} problem(s))", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

/// All possible errors that can occur in ops-launcher.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Config file does not exist at the expected path.
    #[error("Config file not found: {0}\nCreate it or point OPS_CONFIG at an existing inventory.")]
    ConfigNotFound(PathBuf),

    /// Could not determine the user's home directory.
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The inventory is not well-formed YAML.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The inventory parsed but failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Qualified host token names a client that does not exist.
    #[error("Unknown client '{0}'. Run `ops ls` to see available clients.")]
    UnknownClient(String),

    /// No host matches the token.
    #[error("Unknown host '{0}'. Run `ops ls` to see available hosts.")]
    UnknownHost(String),

    /// A bare host name exists under more than one client.
    #[error("Ambiguous host name '{name}'. Use one of: {}", candidates.join(", "))]
    AmbiguousHost {
        name: String,
        /// Qualified `client:name` forms of every match.
        candidates: Vec<String>,
    },

    /// Action identifier is not in the registry.
    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    /// Host lacks the tag an action requires.
    #[error("Action '{action}' is not available for {host}: missing tag '{tag}'")]
    ActionNotAvailable {
        action: String,
        host: String,
        tag: String,
    },

    /// An action needs an argument that was not supplied.
    #[error("Action '{action}' requires {what}")]
    MissingArgument { action: String, what: String },

    /// The local binary to run is not installed.
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// Interactive prompt failed (e.g. no terminal).
    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// JSON encoding failed (recent-hosts file, `ls --json`).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OpsError {
    /// Exit code for this error when it terminates the process.
    pub fn exit_code(&self) -> i32 {
        match self {
            OpsError::ConfigNotFound(_)
            | OpsError::NoConfigDir
            | OpsError::Parse(_)
            | OpsError::Config(_)
            | OpsError::UnknownClient(_)
            | OpsError::UnknownHost(_)
            | OpsError::AmbiguousHost { .. }
            | OpsError::UnknownAction(_)
            | OpsError::ActionNotAvailable { .. }
            | OpsError::MissingArgument { .. } => exit_code::CONFIG,
            OpsError::CommandNotFound(_) => exit_code::COMMAND_NOT_FOUND,
            OpsError::Io(_) | OpsError::Prompt(_) | OpsError::Json(_) => exit_code::GENERAL,
        }
    }
}

/// Convenient Result type alias for ops-launcher operations.
pub type Result<T> = std::result::Result<T, OpsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_lists_every_issue() {
        let err = ConfigError {
            issues: vec![
                ConfigIssue::new("clients.a.hosts[0].host", "missing required field"),
                ConfigIssue::new("clients.a.hosts[1].port", "must be between 1 and 65535"),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("2 problem(s)"));
        assert!(text.contains("clients.a.hosts[0].host: missing required field"));
        assert!(text.contains("clients.a.hosts[1].port: must be between 1 and 65535"));
        assert!(err.has_path("clients.a.hosts[1].port"));
        assert!(!err.has_path("clients.a.hosts[1]"));
    }

    #[test]
    fn test_ambiguous_message_names_candidates() {
        let err = OpsError::AmbiguousHost {
            name: "x".into(),
            candidates: vec!["a:x".into(), "b:x".into()],
        };
        assert_eq!(err.to_string(), "Ambiguous host name 'x'. Use one of: a:x, b:x");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(OpsError::UnknownHost("h".into()).exit_code(), exit_code::CONFIG);
        assert_eq!(
            OpsError::CommandNotFound("ssh".into()).exit_code(),
            exit_code::COMMAND_NOT_FOUND
        );
        let io = std::io::Error::other("boom");
        assert_eq!(OpsError::Io(io).exit_code(), exit_code::GENERAL);
    }
}
