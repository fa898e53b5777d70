//! Append-only log file
//!
//! Owns the on-disk side of the sink: resolving the file path, appending
//! flushed batches, and reading the tail back.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use super::error::SinkError;

/// File name used by a regular sink
pub const LOG_FILE_NAME: &str = "latest.txt";

/// File name used by a debug sink
pub const DEBUG_LOG_FILE_NAME: &str = "latest-debug.txt";

/// Resolve the log file path inside `log_dir`
pub fn log_file_path(log_dir: &Path, debug: bool) -> PathBuf {
    let name = if debug {
        DEBUG_LOG_FILE_NAME
    } else {
        LOG_FILE_NAME
    };
    log_dir.join(name)
}

/// The sink's single append-only file
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    /// Create the directory if needed and make sure the file inside it can be
    /// opened for appending.
    ///
    /// An unusable directory or file fails here rather than at the first flush.
    pub fn create(log_dir: &Path, debug: bool) -> Result<Self, SinkError> {
        std::fs::create_dir_all(log_dir).map_err(|source| SinkError::CreateDir {
            path: log_dir.to_path_buf(),
            source,
        })?;

        let path = log_file_path(log_dir, debug);
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;

        Ok(Self { path })
    }

    /// Full path to the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a batch as newline-joined lines with a trailing newline, in one write
    pub async fn append(&self, lines: &[String]) -> Result<(), SinkError> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut chunk = lines.join("\n");
        chunk.push('\n');

        let write_err = |source| SinkError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(write_err)?;
        file.write_all(chunk.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;

        Ok(())
    }

    /// Read the last `count` lines in file order.
    ///
    /// A missing file reads as empty.
    pub async fn read_last(&self, count: usize) -> Result<Vec<String>, SinkError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(SinkError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(last_lines(&content, count))
    }
}

/// Take the last `count` lines of `content`, split on LF only
fn last_lines(content: &str, count: usize) -> Vec<String> {
    let content = content.trim_end_matches('\n');
    if content.is_empty() {
        return Vec::new();
    }
    let lines: Vec<&str> = content.split('\n').collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].iter().map(|l| l.to_string()).collect()
}
