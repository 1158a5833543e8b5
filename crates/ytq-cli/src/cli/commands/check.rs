//! `ytq check` – verify the external tools can be run.

use anyhow::{bail, Result};
use ytq_core::config::YtqConfig;
use ytq_core::controller::{AlertLevel, Presenter};
use ytq_core::deps;

use crate::cli::presenter::CliPresenter;

pub async fn run_check(cfg: &YtqConfig) -> Result<()> {
    let tools = deps::check_tools(&cfg.downloader).await;
    let mut missing_required = Vec::new();
    for tool in &tools {
        match &tool.version {
            Some(version) => println!("{:<10} {}", tool.program, version),
            None if tool.optional => {
                println!("{:<10} not found (merging and audio conversion will fail)", tool.program)
            }
            None => {
                println!("{:<10} not found", tool.program);
                missing_required.push(tool.program.clone());
            }
        }
    }
    if !missing_required.is_empty() {
        bail!(
            "required tool(s) missing: {}; install them or set `downloader` in the config",
            missing_required.join(", ")
        );
    }
    Ok(())
}

/// Startup warning for tools that cannot be run. Never fails: a missing
/// downloader still surfaces per job as a launch failure.
pub async fn warn_missing_tools(cfg: &YtqConfig, presenter: &mut CliPresenter) {
    for tool in deps::check_tools(&cfg.downloader).await {
        if tool.is_available() {
            continue;
        }
        tracing::warn!(program = %tool.program, optional = tool.optional, "tool not found");
        let message = if tool.optional {
            format!("'{}' was not found; merging and audio conversion will fail.", tool.program)
        } else {
            format!("'{}' was not found; downloads cannot start until it is installed.", tool.program)
        };
        presenter.alert(AlertLevel::Warning, &message);
    }
}
