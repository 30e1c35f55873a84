//! Inventory file discovery and loading.
//!
//! The inventory path is chosen in this order:
//!
//! 1. An explicit path (the `--config` flag, which clap also binds to `OPS_CONFIG`)
//! 2. `~/.config/ops-launcher/hosts.yaml`
//!
//! A leading `~` in an explicit path is expanded against the home directory.

use crate::config::Inventory;
use crate::error::{OpsError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name under `~/.config`.
pub const APP_NAME: &str = "ops-launcher";

/// Environment variable overriding the inventory path.
pub const ENV_CONFIG_VAR: &str = "OPS_CONFIG";

/// Directory holding the inventory and the recent-hosts history.
///
/// # Errors
///
/// Returns [`OpsError::NoConfigDir`] if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(OpsError::NoConfigDir)?;
    Ok(home.join(".config").join(APP_NAME))
}

/// Default inventory location, `~/.config/ops-launcher/hosts.yaml`.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("hosts.yaml"))
}

/// Pick the inventory path, preferring an explicit override.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand_tilde(path)),
        None => default_config_path(),
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

/// Load and validate an inventory file.
///
/// # Errors
///
/// - [`OpsError::ConfigNotFound`] if the file doesn't exist
/// - [`OpsError::Io`] if reading fails
/// - [`OpsError::Parse`] if the YAML is malformed
/// - [`OpsError::Config`] if validation finds problems
pub fn load_inventory(path: &Path) -> Result<Inventory> {
    if !path.exists() {
        return Err(OpsError::ConfigNotFound(path.to_path_buf()));
    }
    debug!(path = %path.display(), "loading inventory");
    let contents = std::fs::read_to_string(path)?;
    Inventory::from_yaml(&contents)
}

/// Validate an inventory file and describe what was loaded.
pub fn validate(path: &Path) -> Result<String> {
    let inventory = load_inventory(path)?;
    Ok(format!(
        "Config OK: {} client(s), {} host(s) loaded from {}",
        inventory.clients.len(),
        inventory.host_count(),
        path.display()
    ))
}
