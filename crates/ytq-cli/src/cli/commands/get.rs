//! `ytq get` – queue URLs and download them in order.

use anyhow::{bail, Result};
use ytq_core::config::YtqConfig;
use ytq_core::controller::{AlertLevel, Controller, Presenter};
use ytq_core::job::{build_job, JobRequest};

use super::warn_missing_tools;
use crate::cli::presenter::CliPresenter;
use crate::cli::JobArgs;

pub async fn run_get(cfg: &mut YtqConfig, urls: &[String], job: &JobArgs, json: bool) -> Result<()> {
    let remembered = job.apply(cfg);
    let format_id = match &job.format {
        Some(format) => format.clone(),
        None => cfg.format_id().to_string(),
    };

    let mut ctl = Controller::new(cfg.runner(), CliPresenter::new(json));
    ctl.set_reveal_on_finish(cfg.options.open_after_queue);
    warn_missing_tools(cfg, ctl.presenter_mut()).await;

    let rejected = enqueue_urls(&mut ctl, cfg, &format_id, urls);
    if ctl.queue_len() == 0 {
        bail!("none of the {} URL(s) could be queued", urls.len());
    }
    if remembered && rejected == 0 {
        if let Err(e) = cfg.save() {
            tracing::warn!("could not save config: {:#}", e);
        }
    }

    ctl.start()?;
    let mut interrupted = false;
    while ctl.is_running() {
        tokio::select! {
            event = ctl.next_event() => match event {
                Some(event) => ctl.handle(event),
                None => break,
            },
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                if let Err(e) = signal {
                    tracing::warn!("ctrl-c handler failed: {}", e);
                }
                interrupted = true;
                ctl.stop();
            }
        }
    }

    let summary = ctl.summary();
    let left = ctl.queue_len();
    if left > 0 {
        ctl.presenter_mut()
            .note(&format!("{left} job(s) were not started."));
    }
    if !summary.all_succeeded() || left > 0 || rejected > 0 {
        bail!(
            "{} of {} download(s) did not complete",
            urls.len().saturating_sub(summary.succeeded as usize),
            urls.len()
        );
    }
    Ok(())
}

/// Builds and enqueues one job per URL. A URL that fails validation or
/// directory creation is reported and skipped. Returns how many were skipped.
fn enqueue_urls<P: Presenter>(
    ctl: &mut Controller<P>,
    cfg: &YtqConfig,
    format_id: &str,
    urls: &[String],
) -> usize {
    let mut rejected = 0;
    for url in urls {
        let built = build_job(&JobRequest {
            url,
            format_id,
            download_root: &cfg.download_root,
            subfolder: &cfg.subfolder,
            options: &cfg.options,
        });
        match built {
            Ok(descriptor) => ctl.enqueue(descriptor),
            Err(e) => {
                rejected += 1;
                tracing::warn!(url = %url, "job rejected: {}", e);
                let label = if url.trim().is_empty() { "(empty URL)" } else { url.as_str() };
                ctl.presenter_mut()
                    .alert(AlertLevel::Error, &format!("{label}: {e}"));
            }
        }
    }
    rejected
}

#[cfg(test)]
mod tests {
    use super::*;
    use ytq_core::runner::ProcessRunner;

    #[test]
    fn invalid_url_is_skipped_and_the_rest_are_queued() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = YtqConfig {
            download_root: dir.path().to_path_buf(),
            ..YtqConfig::default()
        };
        let mut ctl = Controller::new(ProcessRunner::default(), CliPresenter::new(false));
        let urls: Vec<String> = ["https://a.example/1", "  ", "https://a.example/2"]
            .into_iter()
            .map(String::from)
            .collect();

        let rejected = enqueue_urls(&mut ctl, &cfg, "webm-720", &urls);
        assert_eq!(rejected, 1);
        let queued: Vec<_> = ctl.queued().map(|j| j.source_url().to_string()).collect();
        assert_eq!(queued, ["https://a.example/1", "https://a.example/2"]);
    }

    #[test]
    fn unknown_format_rejects_every_url() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = YtqConfig {
            download_root: dir.path().to_path_buf(),
            ..YtqConfig::default()
        };
        let mut ctl = Controller::new(ProcessRunner::default(), CliPresenter::new(false));
        let urls = vec!["https://a.example/1".to_string()];
        assert_eq!(enqueue_urls(&mut ctl, &cfg, "vhs", &urls), 1);
        assert_eq!(ctl.queue_len(), 0);
    }
}
