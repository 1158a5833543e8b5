//! Job builder: turns a URL, a format choice and option toggles into an
//! immutable [`JobDescriptor`] ready for the runner.

mod sanitize;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::{self, FormatSpec};
use crate::error::{Result, YtqError};

pub use sanitize::{sanitize_subfolder, DEFAULT_SUBFOLDER};

/// Output filename template. The id keeps two items with the same title apart.
pub const OUTPUT_TEMPLATE: &str = "%(title).180B [%(id)s].%(ext)s";

/// Bounds for `-N` (concurrent fragment downloads).
pub const MIN_NET_THREADS: u32 = 1;
pub const MAX_NET_THREADS: u32 = 32;

/// Independent option toggles applied to every job built with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    /// Download the whole playlist when the URL points into one.
    pub playlist_all: bool,
    pub embed_thumbnail: bool,
    pub embed_subs: bool,
    /// Keep intermediate files after post-processing (`-k`).
    pub keep_intermediate: bool,
    /// Reveal the destination folder once the queue drains.
    pub open_after_queue: bool,
    pub net_threads: u32,
    /// Rate limit in the downloader's syntax (e.g. `5M`); empty means none.
    pub limit_rate: String,
    /// Force Windows-compatible filenames.
    pub windows_filenames: bool,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            playlist_all: false,
            embed_thumbnail: false,
            embed_subs: false,
            keep_intermediate: false,
            open_after_queue: true,
            net_threads: 8,
            limit_rate: String::new(),
            windows_filenames: cfg!(windows),
        }
    }
}

impl JobOptions {
    pub fn clamped_threads(&self) -> u32 {
        self.net_threads.clamp(MIN_NET_THREADS, MAX_NET_THREADS)
    }
}

/// One fully assembled download job. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDescriptor {
    source_url: String,
    arguments: Vec<String>,
    destination_directory: PathBuf,
}

impl JobDescriptor {
    /// Wraps an already assembled argument list. Most callers want [`build_job`].
    pub fn new(
        source_url: impl Into<String>,
        arguments: Vec<String>,
        destination_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            arguments,
            destination_directory: destination_directory.into(),
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn destination_directory(&self) -> &Path {
        &self.destination_directory
    }
}

/// Inputs for [`build_job`].
#[derive(Debug, Clone, Copy)]
pub struct JobRequest<'a> {
    pub url: &'a str,
    pub format_id: &'a str,
    pub download_root: &'a Path,
    pub subfolder: &'a str,
    pub options: &'a JobOptions,
}

/// Validates the request, creates the destination directory and assembles the argument list.
///
/// Fails with [`YtqError::Validation`] for an empty URL, a missing or unknown
/// format, or a malformed rate limit; with [`YtqError::Io`] when the
/// destination directory cannot be created.
pub fn build_job(req: &JobRequest<'_>) -> Result<JobDescriptor> {
    let url = req.url.trim();
    if url.is_empty() {
        return Err(YtqError::validation("Enter a URL to download."));
    }
    if req.format_id.trim().is_empty() {
        return Err(YtqError::validation("Select a download format."));
    }
    let format = catalog::lookup(req.format_id).ok_or_else(|| {
        YtqError::validation(format!("Unknown format '{}'.", req.format_id.trim()))
    })?;
    let rate = req.options.limit_rate.trim();
    if !rate.is_empty() && !is_valid_rate_limit(rate) {
        return Err(YtqError::validation(format!(
            "Invalid rate limit '{rate}' (expected e.g. 500K or 5M)."
        )));
    }

    let destination = destination_directory(req.download_root, req.subfolder)?;
    fs::create_dir_all(&destination).map_err(|e| YtqError::io(&destination, e))?;

    let arguments = assemble_arguments(format, &destination, req.options, url);
    tracing::debug!(url, format = format.id, dir = %destination.display(), "built job");
    Ok(JobDescriptor::new(url, arguments, destination))
}

/// `root/sanitized-subfolder`, made absolute against the current directory.
pub fn destination_directory(root: &Path, subfolder: &str) -> Result<PathBuf> {
    let joined = root.join(sanitize_subfolder(subfolder));
    if joined.is_absolute() {
        return Ok(joined);
    }
    let cwd = std::env::current_dir().map_err(|e| YtqError::io(".", e))?;
    Ok(cwd.join(joined))
}

/// Argument list in fixed order: common flags, selector, post args, option
/// flags, output template, URL last.
pub fn assemble_arguments(
    format: &FormatSpec,
    destination: &Path,
    options: &JobOptions,
    url: &str,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-v".into(),
        "-N".into(),
        options.clamped_threads().to_string(),
        "-f".into(),
        format.selector.into(),
    ];
    args.extend(format.post_arguments().map(String::from));

    if options.keep_intermediate {
        args.push("-k".into());
    }
    if options.embed_thumbnail {
        args.push("--embed-thumbnail".into());
    }
    if options.embed_subs {
        args.push("--embed-subs".into());
    }
    args.push(if options.playlist_all {
        "--yes-playlist".into()
    } else {
        "--no-playlist".into()
    });
    let rate = options.limit_rate.trim();
    if !rate.is_empty() {
        args.push("--limit-rate".into());
        args.push(rate.into());
    }
    if options.windows_filenames {
        args.push("--windows-filenames".into());
    }

    args.push("-o".into());
    args.push(destination.join(OUTPUT_TEMPLATE).to_string_lossy().into_owned());
    args.push(url.into());
    args
}

/// Accepts `<number>[K|M|G|T]` with an optional fraction, e.g. `500K`, `4.2M`.
fn is_valid_rate_limit(rate: &str) -> bool {
    let digits = rate.trim_end_matches(|c: char| matches!(c.to_ascii_uppercase(), 'K' | 'M' | 'G' | 'T'));
    if rate.len() - digits.len() > 1 {
        return false;
    }
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.parse::<f64>().map(|v| v > 0.0).unwrap_or(false)
}
