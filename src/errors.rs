//! Typed error definitions for folder_relay.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Source path exists but is not a directory: {0}")]
    SourceNotDirectory(PathBuf),

    #[error("Transfer interrupted before completion")]
    Interrupted,

    #[error("Scheduler is shut down; request not accepted")]
    SchedulerClosed,
}

impl TransferError {
    /// Stable machine-readable code for structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::SourceNotFound(_) => "source_not_found",
            TransferError::SourceNotDirectory(_) => "source_not_directory",
            TransferError::Interrupted => "interrupted",
            TransferError::SchedulerClosed => "scheduler_closed",
        }
    }
}
