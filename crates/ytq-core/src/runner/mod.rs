//! Job runner: one downloader process per job.
//!
//! Spawns the external program with the job's arguments, reads its output
//! (stdout and stderr share one pipe on unix), splits it into lines
//! (carriage returns included), classifies each line and hands it on
//! without blocking the read loop.
//! The exit status becomes an [`ExitOutcome`].

mod control;
mod guard;
mod lines;
mod pipe;
mod terminate;

use serde::Serialize;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::classify::{ClassifiedLine, Classifier};
use crate::error::YtqError;
use crate::job::JobDescriptor;

pub use control::{stop_pair, StopHandle, StopSignal};
pub use lines::LineSplitter;

use guard::FinishGuard;
use pipe::OutputPipe;

/// Program invoked when nothing else is configured.
pub const DEFAULT_PROGRAM: &str = "yt-dlp";

/// Default wait between each termination escalation step.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(3);

const READ_CHUNK: usize = 8 * 1024;

/// How one job ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExitOutcome {
    /// Exit code 0.
    Success,
    /// Any other exit; `-1` when the process died without a code.
    Failure { code: i32 },
    /// The program could not be started at all.
    LaunchFailed { program: String, reason: String },
    /// Terminated on request.
    Stopped,
}

impl ExitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Success)
    }

    /// The outcome in terms of the error taxonomy; `None` for success.
    pub fn error(&self) -> Option<YtqError> {
        match self {
            ExitOutcome::Success => None,
            ExitOutcome::Failure { code } => Some(YtqError::JobFailed { code: *code }),
            ExitOutcome::LaunchFailed { program, .. } => Some(YtqError::DependencyMissing {
                program: program.clone(),
            }),
            ExitOutcome::Stopped => Some(YtqError::UserStopped),
        }
    }

    fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            ExitOutcome::Success
        } else {
            ExitOutcome::Failure {
                code: status.code().unwrap_or(-1),
            }
        }
    }
}

/// Messages from a runner task to the controller, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkerEvent {
    Output { job: u64, line: ClassifiedLine },
    Finished { job: u64, outcome: ExitOutcome },
}

pub type EventSender = mpsc::UnboundedSender<WorkerEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<WorkerEvent>;

/// Launches downloader processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    classifier: Arc<Classifier>,
    grace: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            classifier: Arc::new(Classifier::default()),
            grace: DEFAULT_STOP_GRACE,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// The command as it would be typed, for logs.
    pub fn command_line(&self, job: &JobDescriptor) -> String {
        std::iter::once(self.program.as_str())
            .chain(job.arguments().iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs `job` on a tokio task. Output lines and the final outcome arrive on `events`.
    pub fn spawn(&self, seq: u64, job: JobDescriptor, events: EventSender) -> RunningJob {
        let (stop, signal) = stop_pair();
        let runner = self.clone();
        let task_job = job.clone();
        tokio::spawn(async move {
            let guard = FinishGuard::new(seq, events.clone());
            let outcome = runner
                .run(&task_job, signal, |line| {
                    let _ = events.send(WorkerEvent::Output { job: seq, line });
                })
                .await;
            tracing::info!(job = seq, ?outcome, "job finished");
            guard.finish(outcome);
        });
        RunningJob { seq, job, stop }
    }

    /// Runs `job` to completion, calling `on_line` for every classified output line.
    pub async fn run<F>(&self, job: &JobDescriptor, stop: StopSignal, mut on_line: F) -> ExitOutcome
    where
        F: FnMut(ClassifiedLine),
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(job.arguments())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        terminate::configure(&mut cmd);
        let output = match OutputPipe::attach(&mut cmd) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("could not create output pipe: {}", e);
                return ExitOutcome::LaunchFailed {
                    program: self.program.clone(),
                    reason: format!("could not start '{}': {e}", self.program),
                };
            }
        };

        let spawned = cmd.spawn();
        // Releases the parent's copies of the pipe's write end.
        drop(cmd);
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(program = %self.program, "spawn failed: {}", e);
                return ExitOutcome::LaunchFailed {
                    program: self.program.clone(),
                    reason: describe_spawn_error(&self.program, &e),
                };
            }
        };
        tracing::debug!(pid = ?child.id(), url = job.source_url(), "downloader started");

        let (mut stdout, mut stderr) = output.streams(&mut child);
        let mut out_lines = LineSplitter::default();
        let mut err_lines = LineSplitter::default();
        let mut out_buf = vec![0u8; READ_CHUNK];
        let mut err_buf = vec![0u8; READ_CHUNK];
        let mut stop_rx = stop.rx;

        let mut stop_seen = false;
        let mut stopped = false;
        let mut status: Option<ExitStatus> = None;
        let mut escalate_at: Option<Instant> = None;
        let mut abandon_at: Option<Instant> = None;
        let mut drain_until: Option<Instant> = None;

        loop {
            if status.is_some() && stdout.is_none() && stderr.is_none() {
                break;
            }
            tokio::select! {
                read = read_some(&mut stdout, &mut out_buf) => {
                    let lines = split_read(read, &mut stdout, &mut out_lines, &out_buf);
                    self.emit(lines, &mut on_line);
                }
                read = read_some(&mut stderr, &mut err_buf) => {
                    let lines = split_read(read, &mut stderr, &mut err_lines, &err_buf);
                    self.emit(lines, &mut on_line);
                }
                _ = &mut stop_rx, if !stop_seen => {
                    stop_seen = true;
                    if status.is_none() {
                        stopped = true;
                        tracing::info!(url = job.source_url(), "stop requested; terminating downloader");
                        if terminate::request_graceful(&child) {
                            escalate_at = Some(Instant::now() + self.grace);
                        } else {
                            terminate::force_kill(&mut child);
                            abandon_at = Some(Instant::now() + self.grace);
                        }
                    }
                }
                _ = sleep_until_opt(escalate_at), if status.is_none() => {
                    escalate_at = None;
                    tracing::warn!("downloader ignored termination; killing");
                    terminate::force_kill(&mut child);
                    abandon_at = Some(Instant::now() + self.grace);
                }
                _ = sleep_until_opt(abandon_at), if status.is_none() => {
                    tracing::error!("downloader survived kill; abandoning its handle");
                    break;
                }
                waited = child.wait(), if status.is_none() => {
                    match waited {
                        Ok(s) => {
                            status = Some(s);
                            drain_until = Some(Instant::now() + self.grace);
                        }
                        Err(e) => {
                            tracing::warn!("waiting for downloader failed: {}", e);
                            break;
                        }
                    }
                }
                _ = sleep_until_opt(drain_until) => {
                    tracing::debug!("output still open after exit; closing pipes");
                    break;
                }
            }
        }

        // Whatever is still buffered belongs to this job.
        let tails: Vec<String> = [out_lines.finish(), err_lines.finish()]
            .into_iter()
            .flatten()
            .collect();
        self.emit(tails, &mut on_line);

        if stopped {
            return ExitOutcome::Stopped;
        }
        match status {
            Some(s) => ExitOutcome::from_status(s),
            None => ExitOutcome::Failure { code: -1 },
        }
    }

    fn emit<F>(&self, lines: Vec<String>, on_line: &mut F)
    where
        F: FnMut(ClassifiedLine),
    {
        for line in lines {
            on_line(self.classifier.classify(&line));
        }
    }
}

/// A job handed to a runner task.
#[derive(Debug)]
pub struct RunningJob {
    seq: u64,
    job: JobDescriptor,
    stop: StopHandle,
}

impl RunningJob {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn job(&self) -> &JobDescriptor {
        &self.job
    }

    /// Asks the runner to terminate the process. Returns false if already asked.
    pub fn request_stop(&mut self) -> bool {
        self.stop.request()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.is_requested()
    }
}

fn describe_spawn_error(program: &str, e: &io::Error) -> String {
    match e.kind() {
        io::ErrorKind::NotFound => {
            format!("'{program}' was not found; make sure it is installed and on PATH")
        }
        io::ErrorKind::PermissionDenied => format!("'{program}' is not executable: {e}"),
        _ => format!("could not start '{program}': {e}"),
    }
}

/// Reads from an open stream; a closed stream (`None`) never resolves.
async fn read_some<R>(stream: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match stream {
        Some(r) => r.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Turns a read result into completed lines; closes the stream on EOF or error.
fn split_read<R>(
    read: io::Result<usize>,
    stream: &mut Option<R>,
    splitter: &mut LineSplitter,
    buf: &[u8],
) -> Vec<String> {
    match read {
        Ok(0) => {
            *stream = None;
            splitter.finish().into_iter().collect()
        }
        Ok(n) => splitter.push(&buf[..n]),
        Err(e) => {
            tracing::debug!("output read failed: {}", e);
            *stream = None;
            splitter.finish().into_iter().collect()
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
