//! CLI for the ytq download queue.

mod commands;
mod presenter;
mod shell_command;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use ytq_core::config::{self, YtqConfig};

use commands::{
    run_check, run_completions, run_config, run_formats, run_get, run_man, run_shell,
};

/// Top-level CLI for ytq.
#[derive(Debug, Parser)]
#[command(name = "ytq")]
#[command(about = "ytq: queue downloads through yt-dlp", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Queue one or more URLs and download them in order.
    Get {
        /// Page URLs understood by the downloader.
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,

        #[command(flatten)]
        job: JobArgs,

        /// Print events as JSON lines instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Interactive queue: add URLs while downloads run.
    Shell {
        #[command(flatten)]
        job: JobArgs,

        /// Print events as JSON lines instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List the available download formats.
    Formats {
        #[arg(long)]
        json: bool,
    },

    /// Check that the downloader and ffmpeg can be run.
    Check,

    /// Show the config file path and the effective settings.
    Config,

    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },

    /// Print the man page.
    Man,
}

/// Job settings that override the config for this invocation.
#[derive(Debug, Clone, Default, Args)]
pub struct JobArgs {
    /// Format id (see `ytq formats`).
    #[arg(short, long, value_name = "ID")]
    pub format: Option<String>,

    /// Root folder for downloads.
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Subfolder created under the root folder.
    #[arg(long, value_name = "NAME")]
    pub subfolder: Option<String>,

    /// Download the whole playlist when the URL points into one.
    #[arg(long)]
    pub playlist: bool,

    #[arg(long)]
    pub embed_thumbnail: bool,

    #[arg(long)]
    pub embed_subs: bool,

    /// Keep intermediate files after post-processing.
    #[arg(short = 'k', long)]
    pub keep: bool,

    /// Concurrent fragment downloads (1-32).
    #[arg(short = 'N', long, value_name = "N")]
    pub threads: Option<u32>,

    /// Download rate limit, e.g. 500K or 5M.
    #[arg(long, value_name = "RATE")]
    pub limit_rate: Option<String>,

    /// Do not open the download folder when the queue finishes.
    #[arg(long)]
    pub no_open: bool,
}

impl JobArgs {
    /// Applies the overrides to `cfg`. Returns true when a remembered choice
    /// (format, root folder, subfolder) changed.
    pub fn apply(&self, cfg: &mut YtqConfig) -> bool {
        let mut remembered = false;
        if let Some(format) = &self.format {
            remembered |= cfg.last_format != *format;
            cfg.last_format = format.trim().to_string();
        }
        if let Some(dir) = &self.dir {
            remembered |= cfg.download_root != *dir;
            cfg.download_root = dir.clone();
        }
        if let Some(subfolder) = &self.subfolder {
            remembered |= cfg.subfolder != *subfolder;
            cfg.subfolder = subfolder.clone();
        }
        let options = &mut cfg.options;
        options.playlist_all |= self.playlist;
        options.embed_thumbnail |= self.embed_thumbnail;
        options.embed_subs |= self.embed_subs;
        options.keep_intermediate |= self.keep;
        if let Some(threads) = self.threads {
            options.net_threads = threads;
        }
        if let Some(rate) = &self.limit_rate {
            options.limit_rate = rate.trim().to_string();
        }
        if self.no_open {
            options.open_after_queue = false;
        }
        remembered
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init();
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get { urls, job, json } => run_get(&mut cfg, &urls, &job, json).await?,
            CliCommand::Shell { job, json } => run_shell(&mut cfg, &job, json).await?,
            CliCommand::Formats { json } => run_formats(json)?,
            CliCommand::Check => run_check(&cfg).await?,
            CliCommand::Config => run_config(&cfg)?,
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
