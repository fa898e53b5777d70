//! Broker integration
//!
//! The broker is the main external producer of log lines: a poller pulls
//! messages from one topic and forwards them into the sink.

pub mod client;
pub mod poller;

pub use client::{BrokerClient, BrokerError};
pub use poller::{message_text, spawn, MessageSource, PollerConfig, PollerHandle, TopicSource};
