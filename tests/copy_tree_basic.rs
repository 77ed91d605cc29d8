use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use folder_relay::{TransferKind, TransferRequest, TransferScheduler};
use tempfile::tempdir;
use walkdir::WalkDir;

/// Relative path -> file content (None for directories).
fn snapshot(root: &Path) -> BTreeMap<String, Option<Vec<u8>>> {
    let mut map = BTreeMap::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.unwrap();
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .into_owned();
        if entry.file_type().is_file() {
            map.insert(rel, Some(fs::read(entry.path()).unwrap()));
        } else {
            map.insert(rel, None);
        }
    }
    map
}

// Concrete scenario: source /a contains f1.txt and sub/f2.txt; destination /b
// does not exist. After the copy, /b holds the identical tree and /a is untouched.
#[test]
fn copy_replicates_tree_to_missing_destination() -> Result<(), Box<dyn std::error::Error>> {
    let td = tempdir()?;
    let a = td.path().join("a");
    fs::create_dir_all(a.join("sub"))?;
    fs::write(a.join("f1.txt"), "first file")?;
    fs::write(a.join("sub/f2.txt"), "second file")?;
    let b = td.path().join("b");

    let before = snapshot(&a);

    let scheduler = TransferScheduler::new();
    let handle = scheduler.submit(TransferRequest::new(TransferKind::Copy, &a, &b))?;
    let outcome = handle.wait()?;

    assert!(b.join("f1.txt").is_file());
    assert!(b.join("sub/f2.txt").is_file());
    assert_eq!(snapshot(&b), before, "destination tree must be byte-identical");
    assert_eq!(snapshot(&a), before, "source tree must be untouched");
    assert_eq!(outcome.files_transferred, 2);
    assert!(outcome.warning.is_none());

    Ok(())
}

#[test]
fn copy_is_repeatable_over_same_destination() -> Result<(), Box<dyn std::error::Error>> {
    let td = tempdir()?;
    let a = td.path().join("a");
    fs::create_dir_all(&a)?;
    fs::write(a.join("f.txt"), "v1")?;
    let b = td.path().join("b");

    let scheduler = TransferScheduler::new();
    scheduler
        .submit(TransferRequest::new(TransferKind::Copy, &a, &b))?
        .wait()?;

    // Mutate the source and copy again: the second copy wins unconditionally.
    fs::write(a.join("f.txt"), "v2")?;
    scheduler
        .submit(TransferRequest::new(TransferKind::Copy, &a, &b))?
        .wait()?;

    assert_eq!(fs::read_to_string(b.join("f.txt"))?, "v2");
    Ok(())
}
