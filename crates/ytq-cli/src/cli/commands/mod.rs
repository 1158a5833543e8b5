//! CLI command handlers, one per file.

mod check;
mod completions;
mod config;
mod formats;
mod get;
mod man;
mod shell;

pub use check::{run_check, warn_missing_tools};
pub use completions::run_completions;
pub use config::run_config;
pub use formats::run_formats;
pub use get::run_get;
pub use man::run_man;
pub use shell::run_shell;
