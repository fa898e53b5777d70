//! Broker polling producer
//!
//! Pulls messages from a source on a fixed cadence and forwards each one to
//! the log sink at INFO. Retrieval errors are retried forever after a
//! backoff.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::client::{BrokerClient, BrokerError};
use crate::logging::{LogSink, Severity};

/// Anything the poller can pull log messages from
pub trait MessageSource: Send + Sync + 'static {
    /// Retrieve the next message, `None` when there is nothing to log
    fn fetch(&self) -> impl Future<Output = Result<Option<String>, BrokerError>> + Send;
}

/// One broker topic as a message source
#[derive(Debug, Clone)]
pub struct TopicSource {
    client: BrokerClient,
    topic: String,
    partition: Option<u32>,
}

impl TopicSource {
    pub fn new(client: BrokerClient, topic: impl Into<String>, partition: Option<u32>) -> Self {
        Self {
            client,
            topic: topic.into(),
            partition,
        }
    }
}

impl MessageSource for TopicSource {
    async fn fetch(&self) -> Result<Option<String>, BrokerError> {
        let value = self.client.consume(&self.topic, self.partition).await?;
        Ok(message_text(value))
    }
}

/// Turn a consumed payload into a log message.
///
/// Strings are used as-is; `null` and empty values carry no message;
/// anything else is logged as its JSON text.
pub fn message_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Array(ref a) if a.is_empty() => None,
        Value::Object(ref o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}

/// Poll timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Wait after a successful poll
    pub poll_interval: Duration,
    /// Wait after a failed poll
    pub retry_backoff: Duration,
}

/// Handle to a running poller
#[derive(Debug)]
pub struct PollerHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Check if the poller has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop polling and wait for the task to exit
    pub async fn shutdown(self) {
        // Ignore error if the task already exited
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                error!("Broker poller terminated abnormally: {}", e);
            }
        }
    }
}

/// Spawn the poll loop
pub fn spawn<S: MessageSource>(
    source: S,
    sink: Arc<LogSink>,
    config: PollerConfig,
) -> PollerHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(run(source, sink, config, shutdown_rx));
    PollerHandle { shutdown_tx, task }
}

async fn run<S: MessageSource>(
    source: S,
    sink: Arc<LogSink>,
    config: PollerConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    info!("Broker poller started");

    loop {
        let fetched = tokio::select! {
            _ = &mut shutdown_rx => break,
            fetched = source.fetch() => fetched,
        };

        let wait = match fetched {
            Ok(Some(message)) => {
                sink.log(&message, Severity::Info);
                config.poll_interval
            }
            Ok(None) => {
                debug!("No message available");
                config.poll_interval
            }
            Err(e) => {
                warn!("Failed to poll broker: {}", e);
                config.retry_backoff
            }
        };

        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }

    info!("Broker poller stopped");
}
