//! Errors surfaced by the log sink

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the durability-facing sink operations
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to append to log file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read log file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("flush interval must be positive and at most one year")]
    InvalidInterval,
    #[error("flush engine is already running")]
    AlreadyStarted,
    #[error("log sink is closed")]
    Closed,
}
