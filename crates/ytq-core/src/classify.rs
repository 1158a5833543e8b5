//! Output line classification.
//!
//! Tags each downloader output line as a transfer progress update (with a
//! percentage), a post-processing stage, or plain text. Total: never fails,
//! every line gets a tag. Marker substrings come from a [`MarkerTable`] so
//! they can be tuned from config.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// First `<digits>[.<digits>]%` token on a line (a leading minus is tolerated and clamped).
const PERCENT_PATTERN: &str = r"(-?\d+(?:\.\d+)?)%";

fn percent_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PERCENT_PATTERN).expect("percent pattern is valid"))
}

/// Marker substrings recognized in output lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerTable {
    /// Markers of an active transfer line.
    pub progress: Vec<String>,
    /// Markers of post-processing steps (merge, audio extraction, transcode).
    pub stages: Vec<String>,
}

impl Default for MarkerTable {
    fn default() -> Self {
        Self {
            progress: vec!["[download]".into()],
            stages: vec![
                "[Merger]".into(),
                "[ExtractAudio]".into(),
                "[ffmpeg]".into(),
                "[VideoConvertor]".into(),
            ],
        }
    }
}

/// Tag attached to a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LineKind {
    /// Transfer progress in `[0, 100]`.
    Progress(f64),
    ProcessStage,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedLine {
    pub kind: LineKind,
    pub text: String,
}

impl ClassifiedLine {
    pub fn progress(&self) -> Option<f64> {
        match self.kind {
            LineKind::Progress(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    markers: MarkerTable,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(MarkerTable::default())
    }
}

impl Classifier {
    /// Empty markers are dropped; they would match every line.
    pub fn new(mut markers: MarkerTable) -> Self {
        markers.progress.retain(|m| !m.is_empty());
        markers.stages.retain(|m| !m.is_empty());
        Self { markers }
    }

    pub fn markers(&self) -> &MarkerTable {
        &self.markers
    }

    /// Classifies one line. Trailing CR/LF is stripped from the returned text.
    ///
    /// Progress wins over a stage marker on the same line. A progress marker
    /// without a parsable percentage does not make the line a progress line.
    pub fn classify(&self, line: &str) -> ClassifiedLine {
        let text = line.trim_end_matches(['\r', '\n']).to_string();

        let kind = if let Some(pct) = self.progress_of(&text) {
            LineKind::Progress(pct)
        } else if contains_any(&text, &self.markers.stages) {
            LineKind::ProcessStage
        } else {
            LineKind::Plain
        };

        ClassifiedLine { kind, text }
    }

    fn progress_of(&self, text: &str) -> Option<f64> {
        if !contains_any(text, &self.markers.progress) {
            return None;
        }
        parse_percent(text)
    }
}

fn contains_any(text: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| text.contains(m.as_str()))
}

/// First percentage token on the line, clamped to `[0, 100]`.
pub fn parse_percent(text: &str) -> Option<f64> {
    let caps = percent_regex().captures(text)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    if value.is_nan() {
        return None;
    }
    Some(value.clamp(0.0, 100.0))
}

/// Classifies with the default marker table.
pub fn classify(line: &str) -> ClassifiedLine {
    static DEFAULT: OnceLock<Classifier> = OnceLock::new();
    DEFAULT.get_or_init(Classifier::default).classify(line)
}
