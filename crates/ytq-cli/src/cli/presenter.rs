//! Terminal and JSON-lines renderings of controller output.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use ytq_core::controller::{AlertLevel, LogEntry, LogTag, Presenter, RunState};

/// Output chosen with `--json`.
pub enum CliPresenter {
    Terminal(TerminalPresenter),
    Json(JsonPresenter),
}

impl CliPresenter {
    pub fn new(json: bool) -> Self {
        if json {
            CliPresenter::Json(JsonPresenter)
        } else {
            CliPresenter::Terminal(TerminalPresenter::default())
        }
    }

    /// Prints a plain message outside the controller's log stream.
    pub fn note(&mut self, text: &str) {
        match self {
            CliPresenter::Terminal(t) => t.line(text),
            CliPresenter::Json(j) => j.log(LogEntry::new(LogTag::Info, text)),
        }
    }
}

impl Presenter for CliPresenter {
    fn log(&mut self, entry: LogEntry) {
        match self {
            CliPresenter::Terminal(t) => t.log(entry),
            CliPresenter::Json(j) => j.log(entry),
        }
    }

    fn progress(&mut self, percent: f64) {
        match self {
            CliPresenter::Terminal(t) => t.progress(percent),
            CliPresenter::Json(j) => j.progress(percent),
        }
    }

    fn alert(&mut self, level: AlertLevel, message: &str) {
        match self {
            CliPresenter::Terminal(t) => t.alert(level, message),
            CliPresenter::Json(j) => j.alert(level, message),
        }
    }

    fn state_changed(&mut self, state: RunState) {
        match self {
            CliPresenter::Terminal(t) => t.state_changed(state),
            CliPresenter::Json(j) => j.state_changed(state),
        }
    }

    fn reveal_folder(&mut self, path: &Path) {
        match self {
            CliPresenter::Terminal(t) => t.reveal_folder(path),
            CliPresenter::Json(j) => j.reveal_folder(path),
        }
    }
}

/// Human-readable output. Download lines overwrite each other on one row.
#[derive(Default)]
pub struct TerminalPresenter {
    progress_row: bool,
}

fn prefix(tag: LogTag) -> &'static str {
    match tag {
        LogTag::Queue => "[queue] ",
        LogTag::Error => "[error] ",
        LogTag::Process => "[post] ",
        LogTag::Info | LogTag::Success | LogTag::Download | LogTag::Plain => "",
    }
}

impl TerminalPresenter {
    fn end_progress_row(&mut self) {
        if self.progress_row {
            println!();
            self.progress_row = false;
        }
    }

    fn line(&mut self, text: &str) {
        self.end_progress_row();
        println!("{text}");
    }
}

impl Presenter for TerminalPresenter {
    fn log(&mut self, entry: LogEntry) {
        if entry.tag == LogTag::Download {
            let mut out = std::io::stdout().lock();
            let _ = write!(out, "\r\x1b[2K{}", entry.text);
            let _ = out.flush();
            self.progress_row = true;
            return;
        }
        self.line(&format!("{}{}", prefix(entry.tag), entry.text));
    }

    fn progress(&mut self, percent: f64) {
        if percent <= 0.0 {
            self.end_progress_row();
        }
    }

    fn alert(&mut self, level: AlertLevel, message: &str) {
        self.end_progress_row();
        let label = match level {
            AlertLevel::Info => "note",
            AlertLevel::Warning => "warning",
            AlertLevel::Error => "error",
        };
        eprintln!("{label}: {message}");
    }

    fn reveal_folder(&mut self, path: &Path) {
        self.line(&format!("Opening {}", path.display()));
        if let Err(e) = ytq_core::reveal::reveal_folder(path) {
            tracing::warn!(path = %path.display(), "could not open folder: {}", e);
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonEvent<'a> {
    Log { tag: LogTag, text: &'a str },
    Progress { percent: f64 },
    Alert { level: AlertLevel, message: &'a str },
    State { state: RunState },
    Reveal { path: &'a Path },
}

/// One JSON object per line on stdout. Folders are reported, not opened.
pub struct JsonPresenter;

impl JsonPresenter {
    fn emit(&self, event: &JsonEvent<'_>) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!("could not encode event: {}", e),
        }
    }
}

impl Presenter for JsonPresenter {
    fn log(&mut self, entry: LogEntry) {
        self.emit(&JsonEvent::Log {
            tag: entry.tag,
            text: &entry.text,
        });
    }

    fn progress(&mut self, percent: f64) {
        self.emit(&JsonEvent::Progress { percent });
    }

    fn alert(&mut self, level: AlertLevel, message: &str) {
        self.emit(&JsonEvent::Alert { level, message });
    }

    fn state_changed(&mut self, state: RunState) {
        self.emit(&JsonEvent::State { state });
    }

    fn reveal_folder(&mut self, path: &Path) {
        self.emit(&JsonEvent::Reveal { path });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_events_are_tagged() {
        let ev = JsonEvent::Log {
            tag: LogTag::Success,
            text: "--- Download finished ---",
        };
        assert_eq!(
            serde_json::to_string(&ev).unwrap(),
            r#"{"type":"log","tag":"success","text":"--- Download finished ---"}"#
        );
        let ev = JsonEvent::State {
            state: RunState::Idle,
        };
        assert_eq!(
            serde_json::to_string(&ev).unwrap(),
            r#"{"type":"state","state":"idle"}"#
        );
    }

    #[test]
    fn prefixes_mark_queue_and_errors() {
        assert_eq!(prefix(LogTag::Queue), "[queue] ");
        assert_eq!(prefix(LogTag::Error), "[error] ");
        assert_eq!(prefix(LogTag::Plain), "");
    }
}
