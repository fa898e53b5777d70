//! HTTP API module
//!
//! Exposes the log sink to other services: tail queries, forced flushes and
//! a liveness probe.

pub mod server;

pub use server::{router, start, ServerHandle};

use serde::{Deserialize, Serialize};

/// Body of `GET /logs/last/:count`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastLogsResponse {
    pub logs: Vec<String>,
}

/// Body of plain status replies (`/echo`, `/logs/flush`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
    /// Lines written by a flush
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub written: Option<usize>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            written: None,
        }
    }
}

/// Body of a failed request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_response_omits_written() {
        let json = serde_json::to_string(&MessageResponse::new("Service is up")).unwrap();
        assert_eq!(json, r#"{"message":"Service is up"}"#);
    }

    #[test]
    fn test_message_response_with_written() {
        let response = MessageResponse {
            message: "Logs flushed".to_string(),
            written: Some(3),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"message":"Logs flushed","written":3}"#);
    }

    #[test]
    fn test_last_logs_parsing() {
        let parsed: LastLogsResponse = serde_json::from_str(r#"{"logs":["a","b"]}"#).unwrap();
        assert_eq!(parsed.logs, vec!["a", "b"]);
    }
}
