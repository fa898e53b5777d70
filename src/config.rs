//! Configuration management for logkeeper

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::{SinkConfig, MAX_FLUSH_INTERVAL};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the log file (`~` is expanded)
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Debug sink: writes `latest-debug.txt` and tags lines with `/DEBUG`
    #[serde(default)]
    pub debug: bool,

    /// Seconds between scheduled flushes (default: 2.0)
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: f64,

    /// Port for the HTTP query server
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Broker base URL; the poller is disabled when unset
    #[serde(default)]
    pub broker_url: Option<String>,

    /// Topic consumed by the poller
    #[serde(default = "default_broker_topic")]
    pub broker_topic: String,

    /// Seconds to wait between polls (default: 100)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds to wait after a failed poll (default: 100)
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_secs: u64,
}

fn default_log_dir() -> PathBuf {
    logs_dir()
}

fn default_flush_interval() -> f64 {
    2.0
}

fn default_http_port() -> u16 {
    8000
}

fn default_broker_topic() -> String {
    "LOGGING".to_string()
}

fn default_poll_interval() -> u64 {
    100
}

fn default_retry_backoff() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            debug: false,
            flush_interval_secs: default_flush_interval(),
            http_port: default_http_port(),
            broker_url: None,
            broker_topic: default_broker_topic(),
            poll_interval_secs: default_poll_interval(),
            retry_backoff_secs: default_retry_backoff(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`, or return default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the sink cannot run with
    pub fn validate(&self) -> Result<()> {
        let in_range = Duration::try_from_secs_f64(self.flush_interval_secs)
            .map(|d| !d.is_zero() && d <= MAX_FLUSH_INTERVAL)
            .unwrap_or(false);
        if !in_range {
            anyhow::bail!(
                "flush_interval_secs must be positive and at most {}, got {}",
                MAX_FLUSH_INTERVAL.as_secs(),
                self.flush_interval_secs
            );
        }
        Ok(())
    }

    /// Log directory with `~` expanded
    pub fn expanded_log_dir(&self) -> PathBuf {
        let raw = self.log_dir.to_string_lossy();
        PathBuf::from(shellexpand::tilde(&raw).into_owned())
    }

    /// Flush period; values that are not a valid duration map to `Duration::MAX`,
    /// which the sink rejects at open
    pub fn flush_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.flush_interval_secs).unwrap_or(Duration::MAX)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    /// Parameters for opening the log sink
    pub fn sink_config(&self) -> SinkConfig {
        SinkConfig::new(self.expanded_log_dir(), self.debug, self.flush_interval())
    }
}

/// Get the base configuration directory (~/.logkeeper)
/// Falls back to ./.logkeeper if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".logkeeper")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".logkeeper"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the path to the default logs directory
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}
