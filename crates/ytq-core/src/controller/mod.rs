//! Queue controller.
//!
//! Owns the FIFO, the run state and the channel the runner tasks report on.
//! Everything the user sees goes through a [`Presenter`]; the controller never
//! touches a terminal or window itself. Worker events are applied one at a
//! time with [`Controller::handle`], so presenter calls stay on the caller's task.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::classify::LineKind;
use crate::job::JobDescriptor;
use crate::queue::JobQueue;
use crate::runner::{
    EventReceiver, EventSender, ExitOutcome, ProcessRunner, RunningJob, WorkerEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
}

/// Visual category of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTag {
    Queue,
    Info,
    Success,
    Error,
    Download,
    Process,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub tag: LogTag,
    pub text: String,
}

impl LogEntry {
    pub fn new(tag: LogTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

/// Sink for everything the controller wants the user to see.
pub trait Presenter {
    fn log(&mut self, entry: LogEntry);

    /// Progress of the current job, 0..=100. Reset to 0 between jobs.
    fn progress(&mut self, percent: f64);

    fn alert(&mut self, level: AlertLevel, message: &str);

    fn state_changed(&mut self, _state: RunState) {}

    fn reveal_folder(&mut self, path: &Path) {
        if let Err(e) = crate::reveal::reveal_folder(path) {
            tracing::warn!(path = %path.display(), "could not open folder: {}", e);
        }
    }
}

/// Counts for one drain of the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainSummary {
    pub succeeded: u32,
    pub failed: u32,
    pub stopped: u32,
    pub launch_failed: u32,
}

impl DrainSummary {
    fn record(&mut self, outcome: &ExitOutcome) {
        match outcome {
            ExitOutcome::Success => self.succeeded += 1,
            ExitOutcome::Failure { .. } => self.failed += 1,
            ExitOutcome::Stopped => self.stopped += 1,
            ExitOutcome::LaunchFailed { .. } => self.launch_failed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.succeeded + self.failed + self.stopped + self.launch_failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.total() == self.succeeded
    }
}

impl std::fmt::Display for DrainSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} succeeded, {} failed", self.succeeded, self.failed)?;
        if self.launch_failed > 0 {
            write!(f, ", {} could not start", self.launch_failed)?;
        }
        if self.stopped > 0 {
            write!(f, ", {} stopped", self.stopped)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("a download is already running")]
    AlreadyRunning,
    #[error("the download queue is empty")]
    EmptyQueue,
}

pub struct Controller<P> {
    runner: ProcessRunner,
    presenter: P,
    queue: JobQueue,
    state: RunState,
    active: Option<RunningJob>,
    events_tx: EventSender,
    events_rx: EventReceiver,
    next_seq: u64,
    reveal_on_finish: bool,
    last_success_dir: Option<PathBuf>,
    summary: DrainSummary,
    launch_alerted: bool,
}

impl<P: Presenter> Controller<P> {
    pub fn new(runner: ProcessRunner, presenter: P) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            runner,
            presenter,
            queue: JobQueue::new(),
            state: RunState::Idle,
            active: None,
            events_tx,
            events_rx,
            next_seq: 1,
            reveal_on_finish: false,
            last_success_dir: None,
            summary: DrainSummary::default(),
            launch_alerted: false,
        }
    }

    /// Open the last successful job's folder when a drain completes.
    pub fn set_reveal_on_finish(&mut self, reveal: bool) {
        self.reveal_on_finish = reveal;
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Jobs still waiting, in run order. Excludes the active job.
    pub fn queued(&self) -> impl Iterator<Item = &JobDescriptor> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn active_job(&self) -> Option<&JobDescriptor> {
        self.active.as_ref().map(RunningJob::job)
    }

    /// Counts for the current drain, or the last one when idle.
    pub fn summary(&self) -> DrainSummary {
        self.summary
    }

    /// Appends a job. Allowed in any state; a running drain picks it up.
    pub fn enqueue(&mut self, job: JobDescriptor) {
        let text = format!("Added to queue: {}", job.source_url());
        tracing::debug!(url = job.source_url(), queued = self.queue.len() + 1, "enqueued");
        self.queue.enqueue(job);
        self.presenter.log(LogEntry::new(LogTag::Queue, text));
    }

    /// Drops every queued job. The active job keeps running.
    pub fn clear_queue(&mut self) -> usize {
        let removed = self.queue.clear();
        self.presenter.log(LogEntry::new(
            LogTag::Queue,
            format!("Queue cleared ({removed} removed)"),
        ));
        removed
    }

    /// Begins draining the queue.
    pub fn start(&mut self) -> Result<(), StartError> {
        if self.state == RunState::Running {
            self.presenter
                .alert(AlertLevel::Warning, "A download is already running.");
            return Err(StartError::AlreadyRunning);
        }
        if self.queue.is_empty() {
            self.presenter
                .alert(AlertLevel::Info, "The download queue is empty.");
            return Err(StartError::EmptyQueue);
        }
        self.set_state(RunState::Running);
        self.summary = DrainSummary::default();
        self.last_success_dir = None;
        self.launch_alerted = false;
        self.presenter.progress(0.0);
        self.presenter.log(LogEntry::new(
            LogTag::Info,
            format!("--- Queue started ({} jobs) ---", self.queue.len()),
        ));
        tracing::info!(jobs = self.queue.len(), "queue started");
        self.launch_next();
        Ok(())
    }

    /// Asks the active job to terminate. The queue is left as it is and
    /// nothing further is launched once the job reports back.
    pub fn stop(&mut self) -> bool {
        match self.active.as_mut() {
            Some(active) => {
                if active.request_stop() {
                    tracing::info!(job = active.seq(), "stop requested");
                    self.presenter
                        .log(LogEntry::new(LogTag::Info, "Stopping the current download..."));
                    true
                } else {
                    false
                }
            }
            None => {
                self.presenter
                    .alert(AlertLevel::Info, "Nothing is downloading right now.");
                false
            }
        }
    }

    /// Waits for the next runner event.
    pub async fn next_event(&mut self) -> Option<WorkerEvent> {
        self.events_rx.recv().await
    }

    /// Applies one runner event.
    pub fn handle(&mut self, event: WorkerEvent) {
        let active_seq = self.active.as_ref().map(RunningJob::seq);
        match event {
            WorkerEvent::Output { job, line } => {
                if active_seq != Some(job) {
                    tracing::debug!(job, "dropping output from an inactive job");
                    return;
                }
                let tag = match line.kind {
                    LineKind::Progress(percent) => {
                        self.presenter.progress(percent);
                        LogTag::Download
                    }
                    LineKind::ProcessStage => LogTag::Process,
                    LineKind::Plain => LogTag::Plain,
                };
                self.presenter.log(LogEntry::new(tag, line.text));
            }
            WorkerEvent::Finished { job, outcome } => {
                if active_seq != Some(job) {
                    tracing::debug!(job, "ignoring completion of an inactive job");
                    return;
                }
                self.finish_job(outcome);
            }
        }
    }

    /// Applies events until the drain ends.
    pub async fn run_until_idle(&mut self) {
        while self.state == RunState::Running {
            match self.events_rx.recv().await {
                Some(event) => self.handle(event),
                None => break,
            }
        }
    }

    fn finish_job(&mut self, outcome: ExitOutcome) {
        let Some(finished) = self.active.take() else {
            return;
        };
        self.presenter.progress(0.0);
        self.summary.record(&outcome);
        if outcome.is_success() {
            self.last_success_dir = Some(finished.job().destination_directory().to_path_buf());
        }
        match &outcome {
            ExitOutcome::Success => {
                self.presenter
                    .log(LogEntry::new(LogTag::Success, "--- Download finished ---"));
            }
            ExitOutcome::Failure { code } => {
                self.presenter.log(LogEntry::new(
                    LogTag::Error,
                    format!("--- Download failed (exit code {code}) ---"),
                ));
            }
            ExitOutcome::LaunchFailed { reason, .. } => {
                self.presenter
                    .log(LogEntry::new(LogTag::Error, format!("--- {reason} ---")));
                if !self.launch_alerted {
                    self.launch_alerted = true;
                    self.presenter.alert(AlertLevel::Error, reason);
                }
            }
            ExitOutcome::Stopped => {
                self.presenter
                    .log(LogEntry::new(LogTag::Error, "--- Stopped by user ---"));
            }
        }
        // A stop that raced the job's own exit still ends the drain here.
        if outcome == ExitOutcome::Stopped || finished.stop_requested() {
            self.halt_after_stop();
            return;
        }
        self.launch_next();
    }

    fn halt_after_stop(&mut self) {
        let left = self.queue.len();
        if left > 0 {
            self.presenter.log(LogEntry::new(
                LogTag::Queue,
                format!("{left} job(s) left in the queue"),
            ));
        }
        tracing::info!(left, "drain stopped by user");
        self.set_state(RunState::Idle);
    }

    fn launch_next(&mut self) {
        let Some(job) = self.queue.pop_front() else {
            self.finish_drain();
            return;
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.presenter.log(LogEntry::new(
            LogTag::Info,
            format!("--- Downloading: {} ---", job.source_url()),
        ));
        self.presenter.log(LogEntry::new(
            LogTag::Plain,
            format!("Command: {}", self.runner.command_line(&job)),
        ));
        tracing::info!(job = seq, url = job.source_url(), "launching job");
        self.active = Some(self.runner.spawn(seq, job, self.events_tx.clone()));
    }

    fn finish_drain(&mut self) {
        let summary = self.summary;
        self.set_state(RunState::Idle);
        self.presenter.log(LogEntry::new(
            LogTag::Info,
            format!("--- Queue finished: {summary} ---"),
        ));
        tracing::info!(?summary, "queue finished");
        if self.reveal_on_finish {
            if let Some(dir) = self.last_success_dir.clone() {
                self.presenter.reveal_folder(&dir);
            }
        }
        let level = if summary.all_succeeded() {
            AlertLevel::Info
        } else {
            AlertLevel::Warning
        };
        self.presenter
            .alert(level, &format!("Queue finished: {summary}."));
    }

    fn set_state(&mut self, state: RunState) {
        if self.state != state {
            self.state = state;
            self.presenter.state_changed(state);
        }
    }
}

#[cfg(test)]
mod tests;
