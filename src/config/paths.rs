//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log paths and detects symlinked ancestors
//! so we never follow attacker-controlled links when writing.

use anyhow::{Context, Result};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Config file location: FOLDER_RELAY_CONFIG if set, else the OS config dir.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(p) = env::var_os("FOLDER_RELAY_CONFIG") {
        return Ok(PathBuf::from(p));
    }
    let base = config_dir().context("no OS config directory available")?;
    Ok(base.join("folder_relay").join("config.xml"))
}

/// OS-appropriate default log file path (data dir).
pub fn default_log_path() -> Result<PathBuf> {
    let mut base = data_dir().context("no OS data directory available")?;
    base.push("folder_relay");
    // ensure dir exists (best-effort)
    let _ = fs::create_dir_all(&base);
    base.push("folder_relay.log");
    Ok(base)
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
