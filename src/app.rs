//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the signal handler,
//! builds the scheduler, enqueues the requested transfers, and waits on the
//! per-request handles in submission order.

use anyhow::{Result, bail};
use folder_relay::output as out;
use folder_relay::{Config, TransferError, TransferScheduler};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use folder_relay::config::{default_config_path, ensure_default_config_exists, load_config};

use crate::cli::Args;
use crate::logging::init_tracing;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handle --print-config before logging init
    if args.print_config {
        if let Ok(cfg_env) = std::env::var("FOLDER_RELAY_CONFIG") {
            out::print_info(&format!(
                "Using FOLDER_RELAY_CONFIG (explicit):\n  {}\n",
                cfg_env
            ));
            out::print_info("To override, unset FOLDER_RELAY_CONFIG or set it to another file.");
            return Ok(());
        }
        match default_config_path() {
            Ok(p) => {
                out::print_info(&format!("Default folder_relay config path:\n  {}\n", p.display()));
                if p.exists() {
                    out::print_info("A config file already exists at that location.");
                } else {
                    out::print_info("No config file exists there yet; a template is created on first run.");
                }
            }
            Err(e) => {
                out::print_error(&format!("Could not determine a default config path: {e}"));
            }
        }
        return Ok(());
    }

    // Create a template config if none exists, then carry on with the run.
    if let Some(path) = ensure_default_config_exists() {
        out::print_info(&format!(
            "A template folder_relay config was written to: {}",
            path.display()
        ));
    }

    // Build config (may read XML). CLI args override config values.
    let mut cfg = match load_config() {
        Ok(Some(loaded)) => loaded,
        Ok(None) => Config::default(),
        Err(e) => {
            out::print_warn(&format!("Could not load config; using defaults: {e}"));
            Config::default()
        }
    };
    if let Some(level) = args.effective_log_level() {
        cfg.log_level = level;
    }

    // Parse the work list before logging init so usage errors stay plain.
    let requests = args.requests()?;

    // Initialize logging and capture the guard so we can drop it on signal
    let guard_opt: Option<tracing_appender::non_blocking::WorkerGuard> =
        init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
            out::print_error(&format!("Failed to initialize logging: {}", e));
            e
        })?;

    debug!("Starting folder_relay: {:?}", args);

    let scheduler = TransferScheduler::new();

    // Guard needs to be dropped on SIGINT to flush logs; the stop signal makes
    // the running traversal abort between stack frames.
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let stop = scheduler.stop_signal();
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            stop.raise();
            out::print_warn("Received interrupt; finishing current file and shutting down...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take(); // drop guard here to flush tracing_appender
            }
        })
        .expect("failed to install signal handler");
    }

    // Enqueue everything up front (FIFO), then wait in the same order.
    let mut handles = Vec::with_capacity(requests.len());
    for request in requests {
        let handle = scheduler.submit(request.clone())?;
        handles.push((request, handle));
    }

    let mut failures = 0usize;
    for (request, handle) in handles {
        match handle.wait() {
            Ok(outcome) => {
                info!(
                    source = %request.source.display(),
                    dest = %outcome.destination.display(),
                    files = outcome.files_transferred,
                    "Transfer completed"
                );
                out::print_success(&format!(
                    "{} '{}' -> '{}' ({} files)",
                    request.kind,
                    request.source.display(),
                    outcome.destination.display(),
                    outcome.files_transferred
                ));
                if let Some(warning) = &outcome.warning {
                    out::print_warn(warning);
                }
            }
            Err(e) => {
                failures += 1;
                if let Some(te) = e.downcast_ref::<TransferError>() {
                    let code = te.code();
                    match te {
                        TransferError::SourceNotFound(path) => {
                            error!(code, kind = "source_not_found", path = %path.display(), "Transfer failed")
                        }
                        TransferError::SourceNotDirectory(path) => {
                            error!(code, kind = "source_not_directory", path = %path.display(), "Transfer failed")
                        }
                        TransferError::Interrupted => {
                            error!(code, kind = "interrupted", "Transfer aborted by user")
                        }
                        TransferError::SchedulerClosed => {
                            error!(code, kind = "scheduler_closed", "Transfer failed")
                        }
                    }
                } else {
                    error!(error = ?e, "Transfer failed");
                }
                out::print_error(&format!(
                    "{} '{}' failed: {}",
                    request.kind,
                    request.source.display(),
                    e
                ));
            }
        }
    }

    scheduler.shutdown();

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    if failures > 0 {
        bail!("{failures} transfer(s) failed");
    }
    Ok(())
}
