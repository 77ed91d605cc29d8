//! Transfer request and outcome types.
//! A request names one source→destination directory operation and its mode;
//! an outcome reports what a finished transfer actually did.

use std::fmt;
use std::path::PathBuf;

/// Transfer mode. The enum is closed: there is no "unknown" kind that could
/// be silently dropped by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Replicate the tree at the destination; leave the source untouched.
    Copy,
    /// Replicate the tree, then delete the source root recursively.
    Move,
}

impl TransferKind {
    /// Parse common mode names (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "copy" | "cp" => Some(TransferKind::Copy),
            "move" | "mv" => Some(TransferKind::Move),
            _ => None,
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransferKind::Copy => "copy",
            TransferKind::Move => "move",
        })
    }
}

/// One source→destination directory transfer.
/// Duplicates are legal; each submission is processed independently in FIFO order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: TransferKind,
}

impl TransferRequest {
    pub fn new(
        kind: TransferKind,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            kind,
        }
    }
}

/// Result of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub destination: PathBuf,
    pub files_transferred: u64,
    /// Directory pairs the walk processed, whether or not the target had to
    /// be created.
    pub dirs_visited: u64,
    /// Set when the transfer succeeded but something was left behind: a move
    /// that could not remove its source root, or non-regular entries a move
    /// lost with the source. The transfer still counts as succeeded.
    pub warning: Option<String>,
}
