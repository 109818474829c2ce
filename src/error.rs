use std::path::PathBuf;

use thiserror::Error;

pub type RunResult<T> = std::result::Result<T, RunError>;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid run config: {0}")]
    InvalidConfig(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("checkpoint error at {}: {reason}", path.display())]
    Checkpoint { path: PathBuf, reason: String },

    #[error("report error: {0}")]
    Report(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl RunError {
    pub fn checkpoint(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RunError::Checkpoint { path: path.into(), reason: reason.into() }
    }
}
