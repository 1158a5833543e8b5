//! `ytq config` – show where the config lives and what is in effect.

use anyhow::Result;
use ytq_core::config::{self, YtqConfig};

pub fn run_config(cfg: &YtqConfig) -> Result<()> {
    match config::config_path() {
        Ok(path) => println!("# {}", path.display()),
        Err(e) => println!("# no config location: {e:#}"),
    }
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
