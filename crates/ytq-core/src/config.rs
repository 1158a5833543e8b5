use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::{self, DEFAULT_FORMAT_ID};
use crate::classify::{Classifier, MarkerTable};
use crate::error::YtqError;
use crate::job::{JobOptions, DEFAULT_SUBFOLDER};
use crate::runner::{ProcessRunner, DEFAULT_PROGRAM};

/// Global configuration loaded from `~/.config/ytq/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YtqConfig {
    /// Downloader executable, looked up on PATH unless absolute.
    pub downloader: String,
    /// Root folder the subfolder is created under.
    pub download_root: PathBuf,
    pub subfolder: String,
    /// Format id selected last time; unknown ids fall back to the default.
    pub last_format: String,
    /// Seconds between termination steps when stopping a job.
    pub stop_grace_secs: u64,
    pub options: JobOptions,
    pub markers: MarkerTable,
}

impl Default for YtqConfig {
    fn default() -> Self {
        Self {
            downloader: DEFAULT_PROGRAM.to_string(),
            download_root: default_download_root(),
            subfolder: DEFAULT_SUBFOLDER.to_string(),
            last_format: DEFAULT_FORMAT_ID.to_string(),
            stop_grace_secs: 3,
            options: JobOptions::default(),
            markers: MarkerTable::default(),
        }
    }
}

impl YtqConfig {
    pub fn parse(data: &str) -> crate::error::Result<Self> {
        toml::from_str(data).map_err(|e| YtqError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> crate::error::Result<String> {
        toml::to_string_pretty(self).map_err(|e| YtqError::Config(e.to_string()))
    }

    /// `last_format` if it names a catalog entry, otherwise the default id.
    pub fn format_id(&self) -> &str {
        match catalog::lookup(&self.last_format) {
            Some(spec) => spec.id,
            None => DEFAULT_FORMAT_ID,
        }
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.markers.clone())
    }

    pub fn runner(&self) -> ProcessRunner {
        ProcessRunner::new(self.downloader.clone())
            .with_classifier(self.classifier())
            .with_stop_grace(Duration::from_secs(self.stop_grace_secs.max(1)))
    }

    /// Write the config as pretty TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let toml = self.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(path, toml).with_context(|| format!("writing {}", path.display()))?;
        tracing::debug!("saved config to {}", path.display());
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }
}

fn default_download_root() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from);
    match home {
        Some(home) => home.join("Downloads"),
        None => PathBuf::from("."),
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ytq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
/// Never fails: any problem is logged and defaults are used.
pub fn load_or_init() -> YtqConfig {
    match config_path() {
        Ok(path) => load_from(&path),
        Err(e) => {
            tracing::warn!("no config location ({:#}); using defaults", e);
            YtqConfig::default()
        }
    }
}

/// Like [`load_or_init`] for an explicit path. A file that cannot be read or
/// does not parse is left in place and defaults are used; a missing file is
/// written out when possible.
pub fn load_from(path: &Path) -> YtqConfig {
    if !path.exists() {
        let default_cfg = YtqConfig::default();
        match default_cfg.save_to(path) {
            Ok(()) => tracing::info!("created default config at {}", path.display()),
            Err(e) => tracing::warn!("could not write default config: {:#}", e),
        }
        return default_cfg;
    }

    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!("could not read config {}: {}; using defaults", path.display(), e);
            return YtqConfig::default();
        }
    };
    match YtqConfig::parse(&data) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("ignoring malformed config {}: {}", path.display(), e);
            YtqConfig::default()
        }
    }
}
