//! Stack-based depth-first directory traversal.
//!
//! The walk keeps an explicit stack of pending {source, target} pairs instead
//! of recursing, so it tolerates trees deeper than any call-stack limit.
//! Sibling directories are processed in LIFO (stack) order; no ordering across
//! siblings is guaranteed.
//!
//! Failure model: no rollback. An error partway through leaves a partially
//! copied/moved tree behind. In Move mode the source root is only removed
//! after the entire subtree has transferred, so a failure before that point
//! leaves the original intact.

use anyhow::{Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::errors::TransferError;
use crate::fs_ops::helpers::io_error_with_help;
use crate::fs_ops::{copy_file_overwrite, ensure_dir, move_file_overwrite};
use crate::request::{TransferKind, TransferOutcome, TransferRequest};

/// One pending source/target directory pair on the traversal stack.
struct FolderPair {
    source: PathBuf,
    target: PathBuf,
}

/// Run one transfer to completion (blocking filesystem I/O).
///
/// `stop` is checked between stack frames; raising it aborts the walk with
/// [`TransferError::Interrupted`].
pub fn run_transfer(request: &TransferRequest, stop: &AtomicBool) -> Result<TransferOutcome> {
    match fs::metadata(&request.source) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => bail!(TransferError::SourceNotDirectory(request.source.clone())),
        Err(_) => bail!(TransferError::SourceNotFound(request.source.clone())),
    }

    let mut files_transferred = 0u64;
    let mut dirs_visited = 0u64;
    let mut skipped = Vec::new();
    let mut stack = vec![FolderPair {
        source: request.source.clone(),
        target: request.destination.clone(),
    }];

    while let Some(pair) = stack.pop() {
        if stop.load(Ordering::Relaxed) {
            bail!(TransferError::Interrupted);
        }

        // Unconditional per pair: empty source directories still materialize
        // at the destination. Pre-existing targets count too.
        ensure_dir(&pair.target)?;
        dirs_visited += 1;

        let entries =
            fs::read_dir(&pair.source).map_err(io_error_with_help("read directory", &pair.source))?;
        for entry in entries {
            let entry =
                entry.map_err(io_error_with_help("read directory entry in", &pair.source))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(io_error_with_help("stat directory entry", &path))?;

            if file_type.is_file() {
                let dest = pair.target.join(entry.file_name());
                match request.kind {
                    TransferKind::Copy => copy_file_overwrite(&path, &dest)?,
                    TransferKind::Move => move_file_overwrite(&path, &dest)?,
                }
                files_transferred += 1;
            } else if file_type.is_dir() {
                stack.push(FolderPair {
                    source: path,
                    target: pair.target.join(entry.file_name()),
                });
            } else if request.kind == TransferKind::Move {
                // The source-root removal below would destroy this entry
                // without it ever reaching the destination.
                warn!(path = %path.display(), "Non-regular entry not transferred; it will be lost with the source");
                skipped.push(path.display().to_string());
            } else {
                debug!(path = %path.display(), "Skipping non-regular directory entry");
            }
        }
    }

    let mut warnings = Vec::new();
    if !skipped.is_empty() {
        warnings.push(format!(
            "non-regular entries not transferred: {}",
            skipped.join(", ")
        ));
    }
    if request.kind == TransferKind::Move {
        // The whole tree is at the destination; only the emptied source
        // skeleton remains. A failed cleanup is a warning, not a failure.
        if let Some(w) = cleanup_source_root(&request.source) {
            warnings.push(w);
        }
    }
    let warning = (!warnings.is_empty()).then(|| warnings.join("; "));

    info!(
        src = %request.source.display(),
        dest = %request.destination.display(),
        kind = %request.kind,
        files = files_transferred,
        dirs = dirs_visited,
        "Transfer finished"
    );

    Ok(TransferOutcome {
        destination: request.destination.clone(),
        files_transferred,
        dirs_visited,
        warning,
    })
}

/// Remove the drained source tree after a move. Returns a warning message on
/// failure instead of an error; the moved data is already safe.
fn cleanup_source_root(source: &Path) -> Option<String> {
    match fs::remove_dir_all(source) {
        Ok(()) => None,
        Err(e) => {
            warn!(src = %source.display(), error = %e, "Source cleanup failed after move");
            Some(format!(
                "moved, but failed to remove source root '{}': {}",
                source.display(),
                e
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn no_stop() -> AtomicBool {
        AtomicBool::new(false)
    }

    fn sample_tree(root: &assert_fs::fixture::ChildPath) {
        root.child("f1.txt").write_str("one").unwrap();
        root.child("sub/f2.txt").write_str("two").unwrap();
    }

    #[test]
    fn copy_replicates_tree_and_leaves_source() {
        let td = assert_fs::TempDir::new().unwrap();
        let src = td.child("a");
        sample_tree(&src);
        let dest = td.child("b");

        let req = TransferRequest::new(TransferKind::Copy, src.path(), dest.path());
        let outcome = run_transfer(&req, &no_stop()).unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.path().join("f1.txt")).unwrap(),
            "one"
        );
        assert_eq!(
            std::fs::read_to_string(dest.path().join("sub/f2.txt")).unwrap(),
            "two"
        );
        assert!(src.path().join("f1.txt").exists());
        assert!(src.path().join("sub/f2.txt").exists());
        assert_eq!(outcome.files_transferred, 2);
        assert_eq!(outcome.dirs_visited, 2);
        assert!(outcome.warning.is_none());
    }

    #[test]
    fn move_replicates_tree_and_removes_source_root() {
        let td = assert_fs::TempDir::new().unwrap();
        let src = td.child("a");
        sample_tree(&src);
        let dest = td.child("b");

        let req = TransferRequest::new(TransferKind::Move, src.path(), dest.path());
        run_transfer(&req, &no_stop()).unwrap();

        assert!(!src.path().exists());
        assert_eq!(
            std::fs::read_to_string(dest.path().join("f1.txt")).unwrap(),
            "one"
        );
        assert_eq!(
            std::fs::read_to_string(dest.path().join("sub/f2.txt")).unwrap(),
            "two"
        );
    }

    #[test]
    fn existing_destination_files_are_overwritten() {
        let td = assert_fs::TempDir::new().unwrap();
        let src = td.child("a");
        src.child("f.txt").write_str("fresh").unwrap();
        let dest = td.child("b");
        dest.child("f.txt").write_str("stale").unwrap();
        dest.child("unrelated.txt").write_str("keep").unwrap();

        let req = TransferRequest::new(TransferKind::Copy, src.path(), dest.path());
        run_transfer(&req, &no_stop()).unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.path().join("f.txt")).unwrap(),
            "fresh"
        );
        // No merge policy applies to files we do not touch.
        assert_eq!(
            std::fs::read_to_string(dest.path().join("unrelated.txt")).unwrap(),
            "keep"
        );
    }

    #[test]
    fn empty_subdirectories_are_replicated() {
        let td = assert_fs::TempDir::new().unwrap();
        let src = td.child("a");
        src.child("empty/inner").create_dir_all().unwrap();
        let dest = td.child("b");

        let req = TransferRequest::new(TransferKind::Copy, src.path(), dest.path());
        run_transfer(&req, &no_stop()).unwrap();

        assert!(dest.path().join("empty/inner").is_dir());
    }

    #[test]
    fn missing_source_reports_typed_error() {
        let td = assert_fs::TempDir::new().unwrap();
        let req = TransferRequest::new(
            TransferKind::Copy,
            td.path().join("nope"),
            td.path().join("b"),
        );

        let err = run_transfer(&req, &no_stop()).unwrap_err();
        match err.downcast_ref::<TransferError>() {
            Some(TransferError::SourceNotFound(p)) => assert_eq!(p, &td.path().join("nope")),
            other => panic!("expected SourceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn file_source_reports_not_a_directory() {
        let td = assert_fs::TempDir::new().unwrap();
        let file = td.child("plain.txt");
        file.write_str("x").unwrap();

        let req = TransferRequest::new(TransferKind::Copy, file.path(), td.path().join("b"));
        let err = run_transfer(&req, &no_stop()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TransferError>(),
            Some(TransferError::SourceNotDirectory(_))
        ));
    }

    #[test]
    fn raised_stop_flag_aborts_with_interrupted() {
        let td = assert_fs::TempDir::new().unwrap();
        let src = td.child("a");
        sample_tree(&src);
        let dest = td.child("b");

        let stop = AtomicBool::new(true);
        let req = TransferRequest::new(TransferKind::Copy, src.path(), dest.path());
        let err = run_transfer(&req, &stop).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TransferError>(),
            Some(TransferError::Interrupted)
        ));
        // Aborted before the first frame: nothing was created.
        assert!(!dest.path().exists());
    }

    #[test]
    fn handles_trees_deeper_than_call_stack_recursion_would_allow() {
        let td = assert_fs::TempDir::new().unwrap();
        let src = td.path().join("deep");
        let mut level = src.clone();
        for _ in 0..300 {
            level.push("d");
        }
        std::fs::create_dir_all(&level).unwrap();
        std::fs::write(level.join("leaf.txt"), "bottom").unwrap();

        let dest = td.path().join("out");
        let req = TransferRequest::new(TransferKind::Copy, &src, &dest);
        let outcome = run_transfer(&req, &no_stop()).unwrap();

        let mut check = dest.clone();
        for _ in 0..300 {
            check.push("d");
        }
        assert_eq!(
            std::fs::read_to_string(check.join("leaf.txt")).unwrap(),
            "bottom"
        );
        assert_eq!(outcome.dirs_visited, 301);
    }

    #[test]
    fn pre_existing_destination_dirs_still_count_as_visited() {
        let td = assert_fs::TempDir::new().unwrap();
        let src = td.child("a");
        sample_tree(&src);
        let dest = td.child("b");
        dest.child("sub").create_dir_all().unwrap();

        let req = TransferRequest::new(TransferKind::Copy, src.path(), dest.path());
        let outcome = run_transfer(&req, &no_stop()).unwrap();

        // dirs_visited reflects the walk, not filesystem creations.
        assert_eq!(outcome.dirs_visited, 2);
    }

    #[test]
    fn cleanup_of_missing_source_root_reports_warning() {
        let td = assert_fs::TempDir::new().unwrap();
        let gone = td.path().join("vanished");

        let warning = cleanup_source_root(&gone).expect("cleanup must report failure");
        assert!(warning.contains("failed to remove source root"));
        assert!(warning.contains("vanished"));
    }

    #[cfg(unix)]
    #[test]
    fn move_with_undeletable_source_root_succeeds_with_warning() {
        use std::os::unix::fs::PermissionsExt;

        // Skip on root: root can remove entries from 0555 directories.
        unsafe {
            if libc::geteuid() == 0 {
                eprintln!("skipping: running as root");
                return;
            }
        }

        let td = assert_fs::TempDir::new().unwrap();
        let holder = td.child("holder");
        let src = holder.child("src");
        src.child("f.txt").write_str("payload").unwrap();
        let dest = td.child("dest");

        // Read-only parent: the source root cannot be unlinked from it.
        let holder_perms = std::fs::metadata(holder.path()).unwrap().permissions();
        std::fs::set_permissions(holder.path(), std::fs::Permissions::from_mode(0o555)).unwrap();

        let req = TransferRequest::new(TransferKind::Move, src.path(), dest.path());
        let result = run_transfer(&req, &no_stop());

        std::fs::set_permissions(holder.path(), holder_perms).unwrap();

        let outcome = result.expect("move must succeed even when cleanup fails");
        let warning = outcome.warning.expect("cleanup failure must be reported");
        assert!(warning.contains("failed to remove source root"));
        assert!(src.path().exists(), "undeletable source root remains");
        assert_eq!(
            std::fs::read_to_string(dest.path().join("f.txt")).unwrap(),
            "payload"
        );
    }

    #[cfg(unix)]
    #[test]
    fn move_warns_about_non_regular_entries_left_behind() {
        let td = assert_fs::TempDir::new().unwrap();
        let src = td.child("a");
        src.child("f.txt").write_str("data").unwrap();
        std::os::unix::fs::symlink(src.path().join("f.txt"), src.path().join("link")).unwrap();
        let dest = td.child("b");

        let req = TransferRequest::new(TransferKind::Move, src.path(), dest.path());
        let outcome = run_transfer(&req, &no_stop()).unwrap();

        let warning = outcome.warning.expect("lost symlink must be reported");
        assert!(warning.contains("non-regular entries not transferred"));
        assert!(warning.contains("link"));
        assert!(!dest.path().join("link").exists());
        assert!(!src.path().exists(), "source root is still removed");
        assert_eq!(
            std::fs::read_to_string(dest.path().join("f.txt")).unwrap(),
            "data"
        );
    }

    #[cfg(unix)]
    #[test]
    fn copy_skips_non_regular_entries_without_warning() {
        let td = assert_fs::TempDir::new().unwrap();
        let src = td.child("a");
        src.child("f.txt").write_str("data").unwrap();
        std::os::unix::fs::symlink(src.path().join("f.txt"), src.path().join("link")).unwrap();
        let dest = td.child("b");

        let req = TransferRequest::new(TransferKind::Copy, src.path(), dest.path());
        let outcome = run_transfer(&req, &no_stop()).unwrap();

        // Nothing is lost in copy mode; the source keeps the entry.
        assert!(outcome.warning.is_none());
        assert!(src.path().join("link").exists());
        assert!(!dest.path().join("link").exists());
    }
}
