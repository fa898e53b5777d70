//! logkeeper - buffered asynchronous log sink service
//!
//! Producers hand log lines to a shared [`logging::LogSink`], which keeps
//! them in memory and appends them to a single file on a fixed interval.
//! The [`api`] module serves the tail of that file over HTTP and the
//! [`broker`] module feeds the sink from a message broker.

pub mod api;
pub mod broker;
pub mod config;
pub mod logging;
