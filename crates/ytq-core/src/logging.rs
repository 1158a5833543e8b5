//! Diagnostic logging for ytq.
//!
//! Events go to `~/.local/state/ytq/ytq.log` when that file can be opened,
//! otherwise to stderr. The filter comes from `YTQ_LOG`, then `RUST_LOG`,
//! then [`DEFAULT_FILTER`]. Downloader output itself is not logged here; it
//! reaches the user through the controller's presenter.

use anyhow::Result;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Environment variable read before `RUST_LOG`.
pub const FILTER_ENV: &str = "YTQ_LOG";

/// Debug for ytq's own crates, info for everything else.
pub const DEFAULT_FILTER: &str = "info,ytq_core=debug,ytq_cli=debug";

/// Size past which the log is moved to `ytq.log.1` at startup.
pub const ROTATE_BYTES: u64 = 5 * 1024 * 1024;

const LOG_FILE: &str = "ytq.log";

/// Where diagnostics ended up after [`init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr { reason: String },
}

impl fmt::Display for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogTarget::File(path) => write!(f, "{}", path.display()),
            LogTarget::Stderr { reason } => write!(f, "stderr ({reason})"),
        }
    }
}

/// Filter directives: `YTQ_LOG` wins over `RUST_LOG`. Blank values are ignored.
pub fn pick_directives(ytq_log: Option<String>, rust_log: Option<String>) -> String {
    [ytq_log, rust_log]
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn env_filter() -> EnvFilter {
    let directives = pick_directives(
        std::env::var(FILTER_ENV).ok(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    );
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("ytq: ignoring log filter {directives:?}: {e}");
        EnvFilter::new(DEFAULT_FILTER)
    })
}

/// Path of the log file: `~/.local/state/ytq/ytq.log`. Parent directories are created.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ytq")?;
    Ok(xdg_dirs.place_state_file(LOG_FILE)?)
}

/// Moves `path` to `<path>.1` when it is larger than `max_bytes`, replacing
/// any older backup. Returns whether a rotation happened.
pub fn rotate_if_large(path: &Path, max_bytes: u64) -> io::Result<bool> {
    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if len <= max_bytes {
        return Ok(false);
    }
    let mut backup = path.as_os_str().to_owned();
    backup.push(".1");
    fs::rename(path, PathBuf::from(backup))?;
    Ok(true)
}

fn open_log_file() -> Result<(PathBuf, fs::File)> {
    let path = log_file_path()?;
    if let Err(e) = rotate_if_large(&path, ROTATE_BYTES) {
        eprintln!("ytq: could not rotate {}: {e}", path.display());
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

/// Installs the global subscriber. Falls back to stderr when the log file
/// cannot be opened, so this never fails.
pub fn init() -> LogTarget {
    let target = match open_log_file() {
        Ok((path, file)) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .try_init();
            LogTarget::File(path)
        }
        Err(e) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(io::stderr)
                .with_ansi(false)
                .try_init();
            LogTarget::Stderr { reason: format!("{e:#}") }
        }
    };
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        target = %target,
        "ytq logging initialized"
    );
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ytq_log_wins_over_rust_log() {
        let picked = pick_directives(Some("ytq_core=trace".into()), Some("warn".into()));
        assert_eq!(picked, "ytq_core=trace");
    }

    #[test]
    fn blank_values_fall_through() {
        assert_eq!(pick_directives(Some("  ".into()), Some("warn".into())), "warn");
        assert_eq!(pick_directives(None, Some(String::new())), DEFAULT_FILTER);
        assert_eq!(pick_directives(None, None), DEFAULT_FILTER);
    }

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn small_log_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE);
        fs::write(&path, b"short\n").unwrap();

        assert!(!rotate_if_large(&path, 1024).unwrap());
        assert!(path.exists());
        assert!(!dir.path().join("ytq.log.1").exists());
    }

    #[test]
    fn large_log_moves_to_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE);
        let backup = dir.path().join("ytq.log.1");
        fs::write(&backup, b"older\n").unwrap();
        fs::write(&path, vec![b'x'; 64]).unwrap();

        assert!(rotate_if_large(&path, 16).unwrap());
        assert!(!path.exists());
        assert_eq!(fs::read(&backup).unwrap().len(), 64);
    }

    #[test]
    fn missing_log_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!rotate_if_large(&dir.path().join(LOG_FILE), 0).unwrap());
    }

    #[test]
    fn target_display() {
        let file = LogTarget::File(PathBuf::from("/tmp/ytq.log"));
        assert_eq!(file.to_string(), "/tmp/ytq.log");
        let stderr = LogTarget::Stderr { reason: "read-only home".into() };
        assert_eq!(stderr.to_string(), "stderr (read-only home)");
    }
}
