use super::*;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Seen {
    Log(LogTag, String),
    Progress(f64),
    Alert(AlertLevel, String),
    State(RunState),
    Reveal(PathBuf),
}

#[derive(Default)]
struct Recorder {
    seen: Vec<Seen>,
}

impl Recorder {
    fn logs(&self, tag: LogTag) -> Vec<&str> {
        self.seen
            .iter()
            .filter_map(|s| match s {
                Seen::Log(t, text) if *t == tag => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn alerts(&self) -> Vec<(AlertLevel, &str)> {
        self.seen
            .iter()
            .filter_map(|s| match s {
                Seen::Alert(level, text) => Some((*level, text.as_str())),
                _ => None,
            })
            .collect()
    }

    fn states(&self) -> Vec<RunState> {
        self.seen
            .iter()
            .filter_map(|s| match s {
                Seen::State(state) => Some(*state),
                _ => None,
            })
            .collect()
    }

    fn reveals(&self) -> Vec<&Path> {
        self.seen
            .iter()
            .filter_map(|s| match s {
                Seen::Reveal(p) => Some(p.as_path()),
                _ => None,
            })
            .collect()
    }

    fn exact(&self, line: &str) -> Option<usize> {
        self.seen
            .iter()
            .position(|s| matches!(s, Seen::Log(_, text) if text == line))
    }

    /// Index of the first log line containing `needle`.
    fn position(&self, needle: &str) -> Option<usize> {
        self.seen
            .iter()
            .position(|s| matches!(s, Seen::Log(_, text) if text.contains(needle)))
    }
}

impl Presenter for Recorder {
    fn log(&mut self, entry: LogEntry) {
        self.seen.push(Seen::Log(entry.tag, entry.text));
    }

    fn progress(&mut self, percent: f64) {
        self.seen.push(Seen::Progress(percent));
    }

    fn alert(&mut self, level: AlertLevel, message: &str) {
        self.seen.push(Seen::Alert(level, message.to_string()));
    }

    fn state_changed(&mut self, state: RunState) {
        self.seen.push(Seen::State(state));
    }

    fn reveal_folder(&mut self, path: &Path) {
        self.seen.push(Seen::Reveal(path.to_path_buf()));
    }
}

fn script_job(url: &str, script: &str, dir: &Path) -> JobDescriptor {
    JobDescriptor::new(
        url,
        vec!["-c".to_string(), script.to_string(), url.to_string()],
        dir,
    )
}

fn sh_controller() -> Controller<Recorder> {
    let runner = ProcessRunner::new("sh").with_stop_grace(Duration::from_millis(300));
    Controller::new(runner, Recorder::default())
}

async fn drain(ctl: &mut Controller<Recorder>) {
    tokio::time::timeout(Duration::from_secs(20), ctl.run_until_idle())
        .await
        .expect("drain timed out");
}

#[test]
fn summary_display_mentions_only_nonzero_extras() {
    let s = DrainSummary {
        succeeded: 2,
        failed: 1,
        stopped: 0,
        launch_failed: 0,
    };
    assert_eq!(s.to_string(), "2 succeeded, 1 failed");
    let s = DrainSummary {
        launch_failed: 1,
        stopped: 1,
        ..s
    };
    assert_eq!(s.to_string(), "2 succeeded, 1 failed, 1 could not start, 1 stopped");
    assert_eq!(s.total(), 5);
    assert!(!s.all_succeeded());
}

#[test]
fn start_on_empty_queue_is_rejected_with_an_alert() {
    let mut ctl = sh_controller();
    assert_eq!(ctl.start(), Err(StartError::EmptyQueue));
    assert_eq!(ctl.state(), RunState::Idle);
    assert_eq!(ctl.presenter().alerts().len(), 1);
    assert_eq!(ctl.presenter().alerts()[0].0, AlertLevel::Info);
    assert!(ctl.presenter().states().is_empty());
}

#[test]
fn stop_while_idle_only_alerts() {
    let mut ctl = sh_controller();
    assert!(!ctl.stop());
    assert_eq!(ctl.presenter().alerts().len(), 1);
    assert_eq!(ctl.state(), RunState::Idle);
}

#[test]
fn enqueue_and_clear_log_queue_lines() {
    let mut ctl = sh_controller();
    let dir = std::env::temp_dir();
    ctl.enqueue(script_job("https://a.example/1", "true", &dir));
    ctl.enqueue(script_job("https://a.example/2", "true", &dir));
    let urls: Vec<_> = ctl.queued().map(|j| j.source_url().to_string()).collect();
    assert_eq!(urls, ["https://a.example/1", "https://a.example/2"]);

    assert_eq!(ctl.clear_queue(), 2);
    assert_eq!(ctl.queue_len(), 0);
    let queue_logs = ctl.presenter().logs(LogTag::Queue);
    assert_eq!(queue_logs.len(), 3);
    assert!(queue_logs[0].contains("https://a.example/1"));
    assert!(queue_logs[2].contains("2 removed"));
}

#[cfg(unix)]
#[tokio::test]
async fn drain_runs_jobs_in_order_and_reports_each_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctl = sh_controller();
    ctl.enqueue(script_job("https://a.example/1", "echo first-out; exit 0", dir.path()));
    ctl.enqueue(script_job("https://a.example/2", "echo second-out; exit 1", dir.path()));

    ctl.start().unwrap();
    assert_eq!(ctl.state(), RunState::Running);
    assert_eq!(ctl.start(), Err(StartError::AlreadyRunning));
    drain(&mut ctl).await;

    assert_eq!(ctl.state(), RunState::Idle);
    let rec = ctl.presenter();
    assert_eq!(rec.states(), [RunState::Running, RunState::Idle]);

    let success = rec.position("Download finished").unwrap();
    let second_start = rec.position("Downloading: https://a.example/2").unwrap();
    let failure = rec.position("exit code 1").unwrap();
    let finished = rec.position("Queue finished").unwrap();
    assert!(success < second_start, "{:?}", rec.seen);
    assert!(second_start < failure, "{:?}", rec.seen);
    assert!(failure < finished, "{:?}", rec.seen);

    // Job output precedes its own outcome.
    assert!(rec.exact("first-out").unwrap() < success);
    assert!(rec.exact("second-out").unwrap() < failure);

    assert_eq!(
        ctl.summary(),
        DrainSummary {
            succeeded: 1,
            failed: 1,
            stopped: 0,
            launch_failed: 0,
        }
    );
    // Warning alert for the already-running rejection and the mixed drain.
    let alerts = rec.alerts();
    assert_eq!(alerts.last().map(|a| a.0), Some(AlertLevel::Warning));
}

#[cfg(unix)]
#[tokio::test]
async fn progress_lines_drive_progress_and_reset_between_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctl = sh_controller();
    ctl.enqueue(script_job(
        "https://a.example/p",
        r#"printf '[download]  25.0%%\r[download]  75.5%%\r[Merger] Merging\n'"#,
        dir.path(),
    ));
    ctl.start().unwrap();
    drain(&mut ctl).await;

    let rec = ctl.presenter();
    let progress: Vec<f64> = rec
        .seen
        .iter()
        .filter_map(|s| match s {
            Seen::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    // Reset at start, two readings, reset after the job.
    assert_eq!(progress, [0.0, 25.0, 75.5, 0.0]);
    assert_eq!(rec.logs(LogTag::Download).len(), 2);
    assert_eq!(rec.logs(LogTag::Process), ["[Merger] Merging"]);
}

#[cfg(unix)]
#[tokio::test]
async fn stop_keeps_the_queue_and_does_not_advance() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctl = sh_controller();
    ctl.enqueue(script_job("https://a.example/slow", "exec sleep 30", dir.path()));
    ctl.enqueue(script_job("https://a.example/next", "exit 0", dir.path()));
    ctl.start().unwrap();
    assert_eq!(ctl.queue_len(), 1);

    assert!(ctl.stop());
    assert!(!ctl.stop(), "second stop is a no-op");
    drain(&mut ctl).await;

    assert_eq!(ctl.state(), RunState::Idle);
    assert_eq!(ctl.queue_len(), 1);
    assert!(ctl.active_job().is_none());
    let rec = ctl.presenter();
    assert!(rec.position("Stopped by user").is_some());
    assert!(rec.position("Downloading: https://a.example/next").is_none());
    assert!(rec.position("Queue finished").is_none());
    assert_eq!(ctl.summary().stopped, 1);
}

#[tokio::test]
async fn missing_downloader_alerts_once_and_drain_continues() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ProcessRunner::new("ytq-test-no-such-binary-4b1d");
    let mut ctl = Controller::new(runner, Recorder::default());
    for i in 0..3 {
        let url = format!("https://a.example/{i}");
        ctl.enqueue(JobDescriptor::new(url.clone(), vec![url], dir.path()));
    }
    ctl.start().unwrap();
    drain(&mut ctl).await;

    let rec = ctl.presenter();
    let errors: Vec<_> = rec
        .alerts()
        .into_iter()
        .filter(|(level, _)| *level == AlertLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.contains("not found"));
    assert_eq!(rec.logs(LogTag::Error).len(), 3);
    assert_eq!(ctl.summary().launch_failed, 3);
    assert_eq!(ctl.state(), RunState::Idle);
    assert!(rec.reveals().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn reveals_the_last_successful_folder_when_enabled() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let mut ctl = sh_controller();
    ctl.set_reveal_on_finish(true);
    ctl.enqueue(script_job("https://a.example/1", "exit 0", first.path()));
    ctl.enqueue(script_job("https://a.example/2", "exit 0", second.path()));
    ctl.enqueue(script_job("https://a.example/3", "exit 3", first.path()));
    ctl.start().unwrap();
    drain(&mut ctl).await;

    assert_eq!(ctl.presenter().reveals(), [second.path()]);
}

#[cfg(unix)]
#[tokio::test]
async fn no_reveal_when_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctl = sh_controller();
    ctl.enqueue(script_job("https://a.example/1", "exit 0", dir.path()));
    ctl.start().unwrap();
    drain(&mut ctl).await;
    assert!(ctl.presenter().reveals().is_empty());
    assert_eq!(ctl.presenter().alerts(), [(AlertLevel::Info, "Queue finished: 1 succeeded, 0 failed.")]);
}

#[cfg(unix)]
#[tokio::test]
async fn jobs_enqueued_mid_drain_are_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctl = sh_controller();
    ctl.enqueue(script_job("https://a.example/1", "sleep 0.2", dir.path()));
    ctl.start().unwrap();
    ctl.enqueue(script_job("https://a.example/2", "exit 0", dir.path()));
    drain(&mut ctl).await;
    assert_eq!(ctl.summary().succeeded, 2);
    assert_eq!(ctl.presenter().states(), [RunState::Running, RunState::Idle]);
}

#[cfg(unix)]
#[tokio::test]
async fn stop_racing_a_finished_job_still_halts_the_drain() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctl = sh_controller();
    ctl.enqueue(script_job("https://a.example/quick", "exit 0", dir.path()));
    ctl.enqueue(script_job("https://a.example/slow", "sleep 5", dir.path()));
    ctl.start().unwrap();

    // The first job's completion is already queued when the stop arrives.
    let finished = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match ctl.next_event().await {
                Some(event @ WorkerEvent::Finished { .. }) => break event,
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("first job finished");
    assert!(ctl.stop());
    ctl.handle(finished);

    assert_eq!(ctl.state(), RunState::Idle);
    assert!(ctl.active_job().is_none());
    assert_eq!(ctl.queue_len(), 1);
    assert_eq!(ctl.summary().succeeded, 1);
    let rec = ctl.presenter();
    assert!(rec.position("Download finished").is_some());
    assert!(rec.position("Downloading: https://a.example/slow").is_none());
    assert!(rec.position("1 job(s) left in the queue").is_some());
    assert!(rec.reveals().is_empty());
}
