use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use logkeeper::api;
use logkeeper::broker::{self, BrokerClient, PollerConfig, TopicSource};
use logkeeper::config::Config;
use logkeeper::logging::{self, LogSink};

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; the sink echoes its own lines to stdout
    logging::init_diagnostics("logkeeper=info");

    let config = match std::env::args_os().nth(1) {
        Some(path) => Config::load_from(&PathBuf::from(path))?,
        None => Config::load()?,
    };

    // An unusable log directory is fatal here, before anything is served
    let sink = LogSink::open(config.sink_config()).context("Failed to open log sink")?;
    sink.start().context("Failed to start flush engine")?;
    tracing::info!("Logging to: {}", sink.path().display());

    let server = api::start(config.http_port, Arc::clone(&sink)).await?;

    let poller = match &config.broker_url {
        Some(url) => match BrokerClient::connect(url).await {
            Ok(client) => {
                let source = TopicSource::new(client, config.broker_topic.clone(), None);
                let timing = PollerConfig {
                    poll_interval: config.poll_interval(),
                    retry_backoff: config.retry_backoff(),
                };
                Some(broker::spawn(source, Arc::clone(&sink), timing))
            }
            Err(e) => {
                tracing::error!("Broker unavailable, polling disabled: {}", e);
                None
            }
        },
        None => None,
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");

    if let Some(poller) = poller {
        poller.shutdown().await;
    }
    server.shutdown()?;
    sink.close().await.context("Final flush failed")?;

    Ok(())
}
