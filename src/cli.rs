//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - A single transfer is given positionally: `folder_relay copy SRC DEST`.
//! - `--batch FILE` enqueues one transfer per line instead; lines are
//!   `MODE<TAB>SRC<TAB>DEST` (whitespace-separated also accepted when the
//!   paths contain no spaces). Blank lines and `#` comments are skipped.
//! - --debug is a shorthand for --log-level debug.

use anyhow::{Result, bail};
use clap::{Parser, ValueHint};
use std::fs;
use std::path::{Path, PathBuf};

use folder_relay::{TransferKind, TransferRequest};

/// CLI wrapper for the folder_relay library.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Queued directory copy/move with single-flight execution"
)]
pub struct Args {
    /// Transfer mode: copy or move.
    #[arg(value_name = "MODE")]
    pub mode: Option<String>,

    /// Source directory.
    #[arg(value_name = "SOURCE", value_hint = ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Destination directory (created if absent).
    #[arg(value_name = "DEST", value_hint = ValueHint::DirPath)]
    pub dest: Option<PathBuf>,

    /// Read transfers from a batch file instead of positional arguments.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath,
          conflicts_with_all = ["mode", "source", "dest"])]
    pub batch: Option<PathBuf>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Print where folder_relay will look for the config file (or FOLDER_RELAY_CONFIG if set), then exit.
    #[arg(
        long,
        help = "Print the config file location used by folder_relay and exit"
    )]
    pub print_config: bool,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<folder_relay::LogLevel> {
        if self.debug {
            return Some(folder_relay::LogLevel::Debug);
        }
        self.log_level
            .as_deref()
            .and_then(folder_relay::LogLevel::parse)
    }

    /// Build the ordered list of transfers to enqueue.
    pub fn requests(&self) -> Result<Vec<TransferRequest>> {
        if let Some(batch) = &self.batch {
            return parse_batch_file(batch);
        }

        let (Some(mode), Some(source), Some(dest)) = (&self.mode, &self.source, &self.dest) else {
            bail!("expected MODE SOURCE DEST (or --batch FILE); see --help");
        };
        let Some(kind) = TransferKind::parse(mode) else {
            bail!("unknown transfer mode '{mode}'; expected 'copy' or 'move'");
        };
        Ok(vec![TransferRequest::new(kind, source, dest)])
    }
}

fn parse_batch_file(path: &Path) -> Result<Vec<TransferRequest>> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read batch file '{}': {}", path.display(), e))?;

    let mut requests = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_batch_line(line) {
            Some(req) => requests.push(req),
            None => bail!(
                "malformed batch line {} in '{}': '{}'",
                lineno + 1,
                path.display(),
                line
            ),
        }
    }
    if requests.is_empty() {
        bail!("batch file '{}' contains no transfers", path.display());
    }
    Ok(requests)
}

/// Parse one batch line. Tab-separated fields take precedence so paths with
/// spaces stay intact; plain whitespace splitting is the fallback.
fn parse_batch_line(line: &str) -> Option<TransferRequest> {
    let fields: Vec<&str> = if line.contains('\t') {
        line.split('\t').map(str::trim).filter(|s| !s.is_empty()).collect()
    } else {
        line.split_whitespace().collect()
    };
    let [mode, src, dest] = fields.as_slice() else {
        return None;
    };
    let kind = TransferKind::parse(mode)?;
    Some(TransferRequest::new(kind, *src, *dest))
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_line_tab_separated_keeps_spaces_in_paths() {
        let req = parse_batch_line("copy\t/tmp/my src\t/tmp/my dest").unwrap();
        assert_eq!(req.kind, TransferKind::Copy);
        assert_eq!(req.source, PathBuf::from("/tmp/my src"));
        assert_eq!(req.destination, PathBuf::from("/tmp/my dest"));
    }

    #[test]
    fn batch_line_whitespace_fallback() {
        let req = parse_batch_line("move /a /b").unwrap();
        assert_eq!(req.kind, TransferKind::Move);
    }

    #[test]
    fn batch_line_rejects_bad_mode_and_arity() {
        assert!(parse_batch_line("sync /a /b").is_none());
        assert!(parse_batch_line("copy /a").is_none());
        assert!(parse_batch_line("copy /a /b /c").is_none());
    }
}
