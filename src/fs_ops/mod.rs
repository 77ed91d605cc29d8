//! Filesystem operations: modularized.

pub mod helpers;
mod transfer;

pub use transfer::{copy_file_overwrite, ensure_dir, move_file_overwrite};
