//! Per-file transfer primitives used by the traversal engine.
//! Overwrite semantics: any pre-existing destination file is deleted first,
//! unconditionally — no merge, no rename-on-conflict.

use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::warn;

use super::helpers::io_error_with_help;

/// Copy `src` to `dest`, replacing any existing destination file.
pub fn copy_file_overwrite(src: &Path, dest: &Path) -> Result<()> {
    remove_existing(dest)?;
    fs::copy(src, dest).map_err(io_error_with_help("copy file to", dest))?;
    Ok(())
}

/// Move `src` to `dest` with the same overwrite semantics.
/// Tries an atomic rename first; falls back to copy+remove (cross-filesystem).
pub fn move_file_overwrite(src: &Path, dest: &Path) -> Result<()> {
    remove_existing(dest)?;
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(error = %e, src = %src.display(), "Rename failed, falling back to copy+remove");
            fs::copy(src, dest).map_err(io_error_with_help("copy file to", dest))?;
            fs::remove_file(src).map_err(io_error_with_help("remove original file", src))?;
            Ok(())
        }
    }
}

/// Create a directory and any missing ancestors; no error if it already exists.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(io_error_with_help("create directory", path))
}

fn remove_existing(dest: &Path) -> Result<()> {
    if dest.exists() {
        fs::remove_file(dest).map_err(io_error_with_help("remove existing destination file", dest))?;
    }
    Ok(())
}
