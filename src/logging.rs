//! Tracing initialization for the relay binary.
//!
//! Behavior:
//! - Verbosity is driven by LogLevel (no RUST_LOG override here).
//! - Stdout gets a compact layer, or JSON when `--json` is set.
//! - A non-blocking file layer is added when `log_file` passes safety checks;
//!   a refused or failed file sink degrades to stdout-only with a warning.
//! - File logging is refused when any ancestor of the path is a symlink.

use anyhow::Result;
use chrono::Local;
use folder_relay::LogLevel;
use folder_relay::config::{default_log_path, path_has_symlink_ancestor};
use folder_relay::output as out;
use std::fmt as stdfmt;
use std::fs::OpenOptions;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::Registry;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

/// Layers are boxed so the one assembly path below can mix formats and sinks.
type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Local wall-clock timestamps (DD/MM/YY HH:MM:SS).
struct RelayTime;
impl FormatTime for RelayTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

fn level_directive(lvl: &LogLevel) -> &'static str {
    match lvl {
        LogLevel::Quiet => "error",
        LogLevel::Normal => "info",
        LogLevel::Info => "debug",
        LogLevel::Debug => "trace",
    }
}

fn stdout_layer(json: bool) -> BoxedLayer {
    if json {
        tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(RelayTime)
            .boxed()
    } else {
        tsfmt::layer().with_timer(RelayTime).compact().boxed()
    }
}

fn file_layer(json: bool, writer: NonBlocking) -> BoxedLayer {
    if json {
        tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(RelayTime)
            .with_writer(writer)
            .boxed()
    } else {
        tsfmt::layer()
            .with_timer(RelayTime)
            .compact()
            .with_writer(writer)
            .boxed()
    }
}

/// Open a non-blocking append writer for the log file:
/// - Refuse if any ancestor is a symlink (prints a reason and returns None)
/// - Best-effort create parent directory
/// - Open for append and wrap with non_blocking
fn open_log_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(true) => {
            eprintln!(
                "Refusing to enable file logging: ancestor of {} is a symlink; proceeding without file logging.",
                path.display()
            );
            return None;
        }
        Err(e) => {
            eprintln!(
                "Error checking log path {} for symlinks: {}; proceeding without file logging.",
                path.display(),
                e
            );
            return None;
        }
        Ok(false) => {}
    }

    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", path.display(), e);
            None
        }
    }
}

/// Initialize tracing based on LogLevel and format. Returns a WorkerGuard
/// when a file appender was created; hold it until shutdown to flush logs.
pub fn init_tracing(
    lvl: &LogLevel,
    log_file: Option<&Path>,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    // The filter rides in the layer stack so every layer stays pinned to the
    // bare Registry.
    let mut layers: Vec<BoxedLayer> = vec![
        EnvFilter::new(level_directive(lvl)).boxed(),
        stdout_layer(json),
    ];

    let mut guard = None;
    if let Some(path) = log_file {
        if let Some((writer, file_guard)) = open_log_writer(path) {
            layers.push(file_layer(json, writer));
            guard = Some(file_guard);
        } else {
            // open_log_writer already printed a short reason to stderr.
            out::print_warn(&format!(
                "Requested file logging to '{}' was not enabled. Check that the parent directory exists, is writable by this process, and that no ancestor is a symlink. Logs will continue to stdout.",
                path.display()
            ));
            if let Ok(def) = default_log_path() {
                out::print_info(&format!(
                    "You can try using the default log path instead: {}",
                    def.display()
                ));
            }
        }
    }

    registry().with(layers).init();
    Ok(guard)
}
