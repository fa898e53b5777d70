//! HTTP client for the message broker

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors talking to the broker
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },
    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("topic {0} not found, try again later")]
    UnknownTopic(String),
}

#[derive(Debug, Deserialize)]
struct TopicsResponse {
    message: Vec<String>,
}

/// Client bound to one broker, with its topic list cached at connect time
#[derive(Debug, Clone)]
pub struct BrokerClient {
    http: reqwest::Client,
    base_url: String,
    topics: Vec<String>,
}

impl BrokerClient {
    /// Check the broker is up (`GET /echo`) and load its topics (`GET /topics`)
    pub async fn connect(base_url: &str) -> Result<Self, BrokerError> {
        let mut client = Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            topics: Vec::new(),
        };

        client.get_ok("/echo").await?;
        client.refresh_topics().await?;

        debug!(url = %client.base_url, topics = client.topics.len(), "Connected to broker");
        Ok(client)
    }

    /// Broker base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Topics known since the last refresh
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Reload the topic list
    pub async fn refresh_topics(&mut self) -> Result<(), BrokerError> {
        let (url, response) = self.get_ok("/topics").await?;
        let body: TopicsResponse = response
            .json()
            .await
            .map_err(|source| BrokerError::Decode { url, source })?;
        self.topics = body.message;
        Ok(())
    }

    /// Consume one message from `topic`, optionally from a fixed partition
    pub async fn consume(&self, topic: &str, partition: Option<u32>) -> Result<Value, BrokerError> {
        if !self.topics.iter().any(|t| t == topic) {
            return Err(BrokerError::UnknownTopic(topic.to_string()));
        }

        let path = match partition {
            Some(p) => format!("/topics/{}/consume/{}", topic, p),
            None => format!("/topics/{}/consume", topic),
        };
        let (url, response) = self.get_ok(&path).await?;
        response
            .json()
            .await
            .map_err(|source| BrokerError::Decode { url, source })
    }

    /// Publish `message` to `topic`
    pub async fn produce(
        &self,
        topic: &str,
        message: &Value,
        partition: Option<u32>,
    ) -> Result<Value, BrokerError> {
        let url = format!("{}/topics/{}/produce", self.base_url, topic);
        let mut request = self.http.post(&url).json(message);
        if let Some(p) = partition {
            request = request.query(&[("partition", p)]);
        }

        let response = request.send().await.map_err(|source| BrokerError::Request {
            url: url.clone(),
            source,
        })?;
        response
            .json()
            .await
            .map_err(|source| BrokerError::Decode { url, source })
    }

    async fn get_ok(&self, path: &str) -> Result<(String, reqwest::Response), BrokerError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| BrokerError::Request {
                url: url.clone(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            return Err(BrokerError::Status {
                url,
                status: response.status(),
            });
        }
        Ok((url, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http, routing::get, routing::post, Json, Router};
    use serde_json::json;

    async fn fake_broker(echo_status: http::StatusCode) -> String {
        let app = Router::new()
            .route("/echo", get(move || async move { echo_status }))
            .route(
                "/topics",
                get(|| async { Json(json!({ "message": ["LOGGING", "AUDIT"] })) }),
            )
            .route(
                "/topics/:topic/consume",
                get(|Path(topic): Path<String>| async move {
                    Json(json!(format!("hello from {}", topic)))
                }),
            )
            .route(
                "/topics/:topic/consume/:partition",
                get(|Path((_, partition)): Path<(String, u32)>| async move {
                    if partition == 0 {
                        (http::StatusCode::OK, Json(json!({ "partition": 0 })))
                    } else {
                        (http::StatusCode::NOT_FOUND, Json(json!(null)))
                    }
                }),
            )
            .route(
                "/topics/:topic/produce",
                post(|Json(body): Json<Value>| async move { Json(json!({ "stored": body })) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_connect_loads_topics() {
        let url = fake_broker(http::StatusCode::OK).await;
        let client = BrokerClient::connect(&url).await.unwrap();

        assert!(!client.base_url().ends_with('/'));
        assert_eq!(client.topics(), ["LOGGING", "AUDIT"]);
    }

    #[tokio::test]
    async fn test_connect_fails_on_bad_echo() {
        let url = fake_broker(http::StatusCode::SERVICE_UNAVAILABLE).await;
        let err = BrokerClient::connect(&url).await.unwrap_err();
        assert!(matches!(err, BrokerError::Status { .. }));
    }

    #[tokio::test]
    async fn test_connect_unreachable() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = BrokerClient::connect(&format!("http://{}", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Request { .. }));
    }

    #[tokio::test]
    async fn test_consume() {
        let url = fake_broker(http::StatusCode::OK).await;
        let client = BrokerClient::connect(&url).await.unwrap();

        let value = client.consume("LOGGING", None).await.unwrap();
        assert_eq!(value, json!("hello from LOGGING"));

        let value = client.consume("AUDIT", Some(0)).await.unwrap();
        assert_eq!(value, json!({ "partition": 0 }));
    }

    #[tokio::test]
    async fn test_consume_errors() {
        let url = fake_broker(http::StatusCode::OK).await;
        let client = BrokerClient::connect(&url).await.unwrap();

        let err = client.consume("MISSING", None).await.unwrap_err();
        assert!(matches!(err, BrokerError::UnknownTopic(t) if t == "MISSING"));

        let err = client.consume("LOGGING", Some(3)).await.unwrap_err();
        assert!(matches!(
            err,
            BrokerError::Status { status, .. } if status == StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn test_produce() {
        let url = fake_broker(http::StatusCode::OK).await;
        let client = BrokerClient::connect(&url).await.unwrap();

        let reply = client
            .produce("LOGGING", &json!({ "text": "hi" }), Some(1))
            .await
            .unwrap();
        assert_eq!(reply, json!({ "stored": { "text": "hi" } }));
    }
}
