//! Buffered log sink
//!
//! Producers queue formatted lines in memory; a background flush engine
//! appends them to a single file on a fixed interval, and callers can force
//! a flush or read the tail of the file back.

mod buffer;
mod engine;
mod error;
mod file_writer;
mod format;
mod sink;

pub use buffer::LineBuffer;
pub use error::SinkError;
pub use file_writer::{log_file_path, LogFile, DEBUG_LOG_FILE_NAME, LOG_FILE_NAME};
pub use format::{echo, format_line, Severity, TIMESTAMP_FORMAT};
pub use sink::{LogSink, SinkCell, SinkConfig, DEFAULT_FLUSH_INTERVAL, MAX_FLUSH_INTERVAL};

/// Install the stderr diagnostics subscriber.
///
/// Operational messages (engine start/stop, flush and poll failures) go here,
/// never into the sink itself.
pub fn init_diagnostics(default_filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Already installed (e.g. by a test harness)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
