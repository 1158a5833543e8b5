//! Probes for the external tools the pipeline relies on.

use serde::Serialize;
use std::process::Stdio;
use tokio::process::Command;

/// Optional helper used by the downloader for merging and audio extraction.
pub const FFMPEG: &str = "ffmpeg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub program: String,
    /// First line of the version output; `None` when the tool could not be run.
    pub version: Option<String>,
    /// Whether the pipeline can work without it.
    pub optional: bool,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        self.version.is_some()
    }
}

/// Runs `program version_flag` and returns the first non-empty output line.
/// Any failure to run (missing binary, non-zero exit) yields `None`.
pub async fn probe(program: &str, version_flag: &str) -> Option<String> {
    let output = Command::new(program)
        .arg(version_flag)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        tracing::debug!(program, status = ?output.status, "version probe failed");
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(String::from)
}

/// Status of the downloader and ffmpeg.
pub async fn check_tools(downloader: &str) -> Vec<ToolStatus> {
    let downloader_version = probe(downloader, "--version").await;
    let ffmpeg_version = probe(FFMPEG, "-version").await;
    vec![
        ToolStatus {
            program: downloader.to_string(),
            version: downloader_version,
            optional: false,
        },
        ToolStatus {
            program: FFMPEG.to_string(),
            version: ffmpeg_version,
            optional: true,
        },
    ]
}
