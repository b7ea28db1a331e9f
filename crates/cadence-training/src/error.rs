use std::path::PathBuf;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("invalid tensor: {0}")]
    InvalidTensor(String),

    #[error("invalid checkpoint name '{name}': expected <prefix>_<digits>.<ext>")]
    InvalidCheckpointName { name: String },

    #[error("checkpoint not found: {}", .0.display())]
    CheckpointNotFound(PathBuf),

    #[error("checkpoint directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("no checkpoint matching '{pattern}' in {}", .dir.display())]
    NoCheckpointFound { dir: PathBuf, pattern: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("summary error: {0}")]
    Summary(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
