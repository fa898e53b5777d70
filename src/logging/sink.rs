//! The log sink facade
//!
//! Ties formatting, the in-memory line buffer, the log file and the flush
//! engine together behind one shared handle.
//!
//! ```text
//! producer --log()--> [format + echo] --> [LineBuffer] --(tick | flush())--> latest.txt
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use chrono::Local;
use tracing::{info, warn};

use super::buffer::LineBuffer;
use super::engine::{self, EngineHandle};
use super::error::SinkError;
use super::file_writer::LogFile;
use super::format::{echo, format_line, Severity};

/// Default period between scheduled flushes
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(2);

/// Longest accepted period between scheduled flushes
pub const MAX_FLUSH_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Parameters fixed when a sink is opened
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    /// Directory holding the log file
    pub log_dir: PathBuf,
    /// Write to `latest-debug.txt` and tag lines with `/DEBUG`
    pub debug: bool,
    /// Period of the flush engine
    pub flush_interval: Duration,
}

impl SinkConfig {
    pub fn new(log_dir: impl Into<PathBuf>, debug: bool, flush_interval: Duration) -> Self {
        Self {
            log_dir: log_dir.into(),
            debug,
            flush_interval,
        }
    }
}

#[derive(Debug)]
enum EngineState {
    Idle,
    Running(EngineHandle),
    Stopped,
}

/// Buffered, periodically flushed log sink.
///
/// Shared between producers as `Arc<LogSink>`. `log` only touches memory;
/// the file is written by scheduled ticks of the flush engine and by
/// explicit `flush`/`close` calls.
#[derive(Debug)]
pub struct LogSink {
    config: SinkConfig,
    file: LogFile,
    buffer: LineBuffer,
    /// Serializes drain-and-write so batches reach the file in drain order
    write_lock: tokio::sync::Mutex<()>,
    engine: Mutex<EngineState>,
    closed: AtomicBool,
}

impl LogSink {
    /// Open a sink, creating its directory and log file.
    ///
    /// No background work starts until [`LogSink::start`].
    pub fn open(config: SinkConfig) -> Result<Arc<Self>, SinkError> {
        if config.flush_interval.is_zero() || config.flush_interval > MAX_FLUSH_INTERVAL {
            return Err(SinkError::InvalidInterval);
        }

        let file = LogFile::create(&config.log_dir, config.debug)?;
        info!(path = %file.path().display(), "Log sink opened");

        Ok(Arc::new(Self {
            config,
            file,
            buffer: LineBuffer::new(),
            write_lock: tokio::sync::Mutex::new(()),
            engine: Mutex::new(EngineState::Idle),
            closed: AtomicBool::new(false),
        }))
    }

    fn engine_state(&self) -> MutexGuard<'_, EngineState> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Launch the flush engine. Must be called from within a Tokio runtime.
    pub fn start(self: &Arc<Self>) -> Result<(), SinkError> {
        let mut state = self.engine_state();
        match *state {
            EngineState::Running(_) => Err(SinkError::AlreadyStarted),
            EngineState::Stopped => Err(SinkError::Closed),
            EngineState::Idle => {
                *state = EngineState::Running(engine::spawn(
                    Arc::downgrade(self),
                    self.config.flush_interval,
                ));
                Ok(())
            }
        }
    }

    /// Format, echo and queue a message
    pub fn log(&self, message: &str, severity: Severity) {
        let line = format_line(message, severity, self.config.debug, Local::now());
        echo(&line, severity);

        if self.closed.load(Ordering::Acquire) {
            warn!("Log sink is closed; line stays queued until an explicit flush");
        }
        self.buffer.push(line);
    }

    pub fn info(&self, message: &str) {
        self.log(message, Severity::Info);
    }

    pub fn warn(&self, message: &str) {
        self.log(message, Severity::Warn);
    }

    pub fn error(&self, message: &str) {
        self.log(message, Severity::Error);
    }

    pub fn fatal(&self, message: &str) {
        self.log(message, Severity::Fatal);
    }

    /// Drain the buffer and append it to the file now.
    ///
    /// Returns the number of lines written. On failure the drained lines go
    /// back to the head of the buffer and the error is returned.
    pub async fn flush(&self) -> Result<usize, SinkError> {
        let _guard = self.write_lock.lock().await;

        let batch = InFlight::drain(&self.buffer);
        if batch.lines.is_empty() {
            return Ok(0);
        }

        self.file.append(&batch.lines).await?;
        Ok(batch.commit())
    }

    /// Last `count` lines already on disk; queued lines are not visible
    pub async fn get_last(&self, count: usize) -> Result<Vec<String>, SinkError> {
        self.file.read_last(count).await
    }

    /// Flush everything queued so far, then stop the flush engine.
    ///
    /// The engine is stopped even when the final flush fails; that failure
    /// is returned afterwards. Calling `close` again only flushes.
    pub async fn close(&self) -> Result<(), SinkError> {
        let flushed = self.flush().await;

        let previous = std::mem::replace(&mut *self.engine_state(), EngineState::Stopped);
        self.closed.store(true, Ordering::Release);

        if let EngineState::Running(handle) = previous {
            handle.stop().await;
            info!(path = %self.file.path().display(), "Log sink closed");
        }

        flushed.map(|_| ())
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Parameters the sink was opened with
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Number of lines waiting for a flush
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the flush engine is running
    pub fn is_running(&self) -> bool {
        matches!(&*self.engine_state(), EngineState::Running(h) if !h.is_finished())
    }
}

/// A drained batch that returns to the buffer unless committed.
///
/// Covers both write errors and a flush future dropped mid-write.
struct InFlight<'a> {
    buffer: &'a LineBuffer,
    lines: Vec<String>,
    written: bool,
}

impl<'a> InFlight<'a> {
    fn drain(buffer: &'a LineBuffer) -> Self {
        Self {
            buffer,
            lines: buffer.drain_all(),
            written: false,
        }
    }

    fn commit(mut self) -> usize {
        self.written = true;
        self.lines.len()
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.written {
            self.buffer.requeue_front(std::mem::take(&mut self.lines));
        }
    }
}

/// First-wins holder for a shared sink.
///
/// Every `get_or_open` after the first successful one returns that same
/// sink and ignores its own parameters.
#[derive(Debug, Default)]
pub struct SinkCell {
    sink: OnceLock<Arc<LogSink>>,
}

impl SinkCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the held sink, opening it with `config` if there is none yet
    pub fn get_or_open(&self, config: SinkConfig) -> Result<Arc<LogSink>, SinkError> {
        if let Some(sink) = self.sink.get() {
            return Ok(Arc::clone(sink));
        }
        let opened = LogSink::open(config)?;
        Ok(Arc::clone(self.sink.get_or_init(|| opened)))
    }

    /// The held sink, if one was opened
    pub fn get(&self) -> Option<Arc<LogSink>> {
        self.sink.get().cloned()
    }
}
