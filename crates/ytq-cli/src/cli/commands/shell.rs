//! `ytq shell` – interactive queue.
//!
//! Stdin lines, worker events and Ctrl-C are multiplexed on one task, so the
//! queue can be edited while a download runs.

use anyhow::Result;
use std::io::{self, BufRead};
use std::path::PathBuf;
use tokio::sync::mpsc;
use ytq_core::catalog;
use ytq_core::config::{self, YtqConfig};
use ytq_core::controller::{AlertLevel, Controller, Presenter};
use ytq_core::job::{build_job, sanitize_subfolder, JobRequest, MAX_NET_THREADS, MIN_NET_THREADS};

use super::formats::render_catalog;
use super::warn_missing_tools;
use crate::cli::presenter::CliPresenter;
use crate::cli::shell_command::{parse_line, ShellCommand, Toggle, HELP};
use crate::cli::JobArgs;

pub async fn run_shell(cfg: &mut YtqConfig, job: &JobArgs, json: bool) -> Result<()> {
    job.apply(cfg);
    let mut ctl = Controller::new(cfg.runner(), CliPresenter::new(json));
    ctl.set_reveal_on_finish(cfg.options.open_after_queue);
    let mut session = Session {
        cfg,
        config_path: config::config_path()
            .map_err(|e| tracing::warn!("config will not be saved: {:#}", e))
            .ok(),
        dirty: false,
    };
    ctl.presenter_mut()
        .note("ytq shell: type 'help' for commands, 'quit' to leave.");
    warn_missing_tools(&*session.cfg, ctl.presenter_mut()).await;

    let mut lines = spawn_stdin_reader();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            line = lines.recv(), if stdin_open => match line.transpose()? {
                Some(line) => {
                    if !session.execute_line(&mut ctl, &line) {
                        break;
                    }
                }
                // Piped input ran out: let a running queue finish.
                None => stdin_open = false,
            },
            Some(event) = ctl.next_event() => ctl.handle(event),
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::warn!("ctrl-c handler failed: {}", e);
                }
                if ctl.is_running() {
                    ctl.stop();
                } else {
                    break;
                }
            }
        }
        if !stdin_open && !ctl.is_running() {
            break;
        }
    }

    if ctl.is_running() {
        ctl.stop();
        ctl.run_until_idle().await;
    }
    session.save();
    Ok(())
}

/// Reads stdin on a plain thread; a blocked read must not hold up shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

struct Session<'a> {
    cfg: &'a mut YtqConfig,
    /// `None` when no config location could be determined.
    config_path: Option<PathBuf>,
    /// A remembered choice changed since the last save.
    dirty: bool,
}

impl Session<'_> {
    /// Runs one input line. Returns false when the shell should exit.
    fn execute_line(&mut self, ctl: &mut Controller<CliPresenter>, line: &str) -> bool {
        match parse_line(line) {
            Ok(command) => self.execute(ctl, command),
            Err(msg) => {
                ctl.presenter_mut().alert(AlertLevel::Warning, &msg);
                true
            }
        }
    }

    fn execute(&mut self, ctl: &mut Controller<CliPresenter>, command: ShellCommand) -> bool {
        match command {
            ShellCommand::Empty => {}
            ShellCommand::Add { url, format } => self.add(ctl, &url, format.as_deref()),
            ShellCommand::Format(id) => match catalog::lookup(&id) {
                Some(spec) => {
                    self.remember(|cfg| cfg.last_format = spec.id.to_string());
                    ctl.presenter_mut()
                        .note(&format!("format: {} ({})", spec.id, spec.label));
                }
                None => ctl
                    .presenter_mut()
                    .alert(AlertLevel::Warning, &format!("Unknown format '{id}'; see 'formats'.")),
            },
            ShellCommand::Dir(dir) => {
                ctl.presenter_mut()
                    .note(&format!("download root: {}", dir.display()));
                self.remember(|cfg| cfg.download_root = dir);
            }
            ShellCommand::Subfolder(name) => {
                ctl.presenter_mut()
                    .note(&format!("subfolder: {}", sanitize_subfolder(&name)));
                self.remember(|cfg| cfg.subfolder = name);
            }
            ShellCommand::Toggle(toggle) => {
                let on = self.toggle(toggle);
                if toggle == Toggle::Open {
                    ctl.set_reveal_on_finish(on);
                }
                let state = if on { "on" } else { "off" };
                ctl.presenter_mut()
                    .note(&format!("{}: {state}", toggle.name()));
            }
            ShellCommand::Threads(n) => {
                let n = n.clamp(MIN_NET_THREADS, MAX_NET_THREADS);
                self.cfg.options.net_threads = n;
                ctl.presenter_mut().note(&format!("threads: {n}"));
            }
            ShellCommand::Rate(rate) => {
                let text = rate.as_deref().unwrap_or("off").to_string();
                self.cfg.options.limit_rate = rate.unwrap_or_default();
                ctl.presenter_mut().note(&format!("rate limit: {text}"));
            }
            ShellCommand::Queue => {
                let listing = queue_listing(ctl);
                ctl.presenter_mut().note(&listing);
            }
            ShellCommand::Clear => {
                ctl.clear_queue();
            }
            ShellCommand::Start => {
                let _ = ctl.start();
            }
            ShellCommand::Stop => {
                ctl.stop();
            }
            ShellCommand::Status => {
                let status = self.status(ctl);
                ctl.presenter_mut().note(&status);
            }
            ShellCommand::Formats => {
                let text = render_catalog(Some(self.cfg.format_id()));
                ctl.presenter_mut().note(text.trim_end());
            }
            ShellCommand::Help => ctl.presenter_mut().note(HELP),
            ShellCommand::Quit => return false,
        }
        true
    }

    fn add(&mut self, ctl: &mut Controller<CliPresenter>, url: &str, format: Option<&str>) {
        let format_id = format.unwrap_or_else(|| self.cfg.format_id());
        let built = build_job(&JobRequest {
            url,
            format_id,
            download_root: &self.cfg.download_root,
            subfolder: &self.cfg.subfolder,
            options: &self.cfg.options,
        });
        match built {
            Ok(job) => {
                ctl.enqueue(job);
                if self.dirty {
                    self.save();
                }
            }
            Err(e) => ctl.presenter_mut().alert(AlertLevel::Error, &e.to_string()),
        }
    }

    fn remember(&mut self, change: impl FnOnce(&mut YtqConfig)) {
        change(&mut *self.cfg);
        self.dirty = true;
    }

    /// Flips an option and returns its new value.
    fn toggle(&mut self, toggle: Toggle) -> bool {
        let options = &mut self.cfg.options;
        let flag = match toggle {
            Toggle::Playlist => &mut options.playlist_all,
            Toggle::Thumbnail => &mut options.embed_thumbnail,
            Toggle::Subs => &mut options.embed_subs,
            Toggle::Keep => &mut options.keep_intermediate,
            Toggle::Open => &mut options.open_after_queue,
            Toggle::WindowsFilenames => &mut options.windows_filenames,
        };
        *flag = !*flag;
        *flag
    }

    fn status(&self, ctl: &Controller<CliPresenter>) -> String {
        let cfg = &*self.cfg;
        let opts = &cfg.options;
        let mut out = format!("state: {:?}\n", ctl.state()).to_lowercase();
        if let Some(job) = ctl.active_job() {
            out.push_str(&format!("downloading: {}\n", job.source_url()));
        }
        out.push_str(&format!("queued: {}\n", ctl.queue_len()));
        out.push_str(&format!("last run: {}\n", ctl.summary()));
        out.push_str(&format!("format: {}\n", cfg.format_id()));
        out.push_str(&format!(
            "destination: {}\n",
            cfg.download_root.join(sanitize_subfolder(&cfg.subfolder)).display()
        ));
        let flags = [
            (Toggle::Playlist, opts.playlist_all),
            (Toggle::Thumbnail, opts.embed_thumbnail),
            (Toggle::Subs, opts.embed_subs),
            (Toggle::Keep, opts.keep_intermediate),
            (Toggle::Open, opts.open_after_queue),
            (Toggle::WindowsFilenames, opts.windows_filenames),
        ];
        let on: Vec<&str> = flags
            .iter()
            .filter(|(_, on)| *on)
            .map(|(t, _)| t.name())
            .collect();
        out.push_str(&format!(
            "options: {}\nthreads: {}, rate limit: {}",
            if on.is_empty() { "none".to_string() } else { on.join(", ") },
            opts.clamped_threads(),
            if opts.limit_rate.is_empty() { "off" } else { opts.limit_rate.as_str() },
        ));
        out
    }

    fn save(&mut self) {
        let Some(path) = &self.config_path else {
            return;
        };
        match self.cfg.save_to(path) {
            Ok(()) => self.dirty = false,
            Err(e) => tracing::warn!("could not save config: {:#}", e),
        }
    }
}

fn queue_listing(ctl: &Controller<CliPresenter>) -> String {
    let mut out = String::new();
    if let Some(job) = ctl.active_job() {
        out.push_str(&format!("  > {}\n", job.source_url()));
    }
    for (i, job) in ctl.queued().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, job.source_url()));
    }
    if out.is_empty() {
        return "queue is empty".to_string();
    }
    out.trim_end().to_string()
}
