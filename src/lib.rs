//! Core library for `folder_relay`.
//!
//! A queued, single-flight directory transfer engine: callers submit
//! copy/move requests to a [`TransferScheduler`], which runs them one at a
//! time, in submission order, on a dedicated worker. Each submission returns
//! a [`TransferHandle`] so the caller can observe success or failure.
//!
//! The traversal itself ([`traverse::run_transfer`]) walks the tree with an
//! explicit stack, replicating empty directories and overwriting destination
//! files unconditionally; Move mode removes the source root after the whole
//! subtree has transferred.

pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod output;
pub mod request;
pub mod scheduler;
pub mod traverse;

pub use config::{Config, LogLevel};
pub use errors::TransferError;
pub use request::{TransferKind, TransferOutcome, TransferRequest};
pub use scheduler::{StopSignal, TransferHandle, TransferScheduler};
