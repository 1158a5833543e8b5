//! Error taxonomy shared by the job builder, runner outcomes and config layer.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum YtqError {
    /// Bad user input; blocks the enqueue and is shown to the user as-is.
    #[error("{0}")]
    Validation(String),

    #[error("'{program}' was not found; make sure it is installed and on PATH")]
    DependencyMissing { program: String },

    #[error("downloader exited with code {code}")]
    JobFailed { code: i32 },

    #[error("stopped by user")]
    UserStopped,

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl YtqError {
    pub fn validation(msg: impl Into<String>) -> Self {
        YtqError::Validation(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        YtqError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, YtqError>;
