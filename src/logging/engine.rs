//! Periodic flush engine
//!
//! A background task that flushes the sink on a fixed interval until it is
//! told to stop. The stop signal is only observed between ticks, so a flush
//! that has started always runs to completion.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use super::sink::LogSink;

/// Handle to the running flush task
#[derive(Debug)]
pub struct EngineHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Check if the task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the task to stop and wait for it to exit
    pub async fn stop(self) {
        // Ignore error if the task already exited
        let _ = self.shutdown_tx.send(());

        match self.task.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => error!("Flush engine terminated abnormally: {}", e),
        }
    }
}

/// Spawn the flush loop for `sink`.
///
/// The task only holds a weak reference, so it never keeps a dropped sink
/// alive. Must be called from within a Tokio runtime.
pub fn spawn(sink: Weak<LogSink>, interval: Duration) -> EngineHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(run(sink, interval, shutdown_rx));
    EngineHandle { shutdown_tx, task }
}

async fn run(sink: Weak<LogSink>, interval: Duration, mut shutdown_rx: oneshot::Receiver<()>) {
    // First tick one full interval after start
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_ms = interval.as_millis() as u64, "Flush engine started");

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => {
                let Some(sink) = sink.upgrade() else {
                    debug!("Log sink dropped, stopping flush engine");
                    break;
                };
                match sink.flush().await {
                    Ok(0) => {}
                    Ok(written) => debug!(written, "Scheduled flush complete"),
                    // Reported on the console only; the batch is back in the queue
                    Err(e) => error!(pending = sink.pending(), "Scheduled flush failed: {}", e),
                }
            }
        }
    }

    info!("Flush engine stopped");
}
