//! Engine error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("sync engine is already running")]
    AlreadyRunning,

    #[error("sync engine is not running")]
    NotRunning,

    #[error("root is not a watchable directory: {}", .0.display())]
    BadRoot(PathBuf),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}
