//! End-to-end checks of the sink lifecycle through the public API

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

use logkeeper::api::{self, LastLogsResponse};
use logkeeper::config::Config;
use logkeeper::logging::{LogSink, Severity, SinkConfig};

#[tokio::test]
async fn started_sink_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let config = SinkConfig::new(temp_dir.path(), false, Duration::from_secs(2));
    let sink = LogSink::open(config).unwrap();
    sink.start().unwrap();

    sink.log("started", Severity::Info);
    assert!(sink.get_last(1).await.unwrap().is_empty());

    sink.flush().await.unwrap();
    let last = sink.get_last(1).await.unwrap();
    assert_eq!(last.len(), 1);
    assert!(last[0].starts_with("[INFO]: started - "));

    sink.close().await.unwrap();
    assert!(!sink.is_running());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn close_persists_everything_logged_before_it() {
    let temp_dir = TempDir::new().unwrap();
    let config = SinkConfig::new(temp_dir.path(), true, Duration::from_millis(15));
    let sink = LogSink::open(config).unwrap();
    sink.start().unwrap();

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                for i in 0..250 {
                    sink.log(&format!("worker {} line {}", p, i), Severity::Warn);
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }

    sink.close().await.unwrap();

    let content = std::fs::read_to_string(temp_dir.path().join("latest-debug.txt")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1000);
    assert!(lines.iter().all(|l| l.starts_with("[WARN/DEBUG]: worker ")));
    assert!(content.ends_with('\n'));
}

#[tokio::test]
async fn http_surface_reads_flushed_lines() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.log_dir = temp_dir.path().to_path_buf();

    let sink = LogSink::open(config.sink_config()).unwrap();
    let app = api::router(Arc::clone(&sink));

    for i in 0..6 {
        sink.log(&format!("event {}", i), Severity::Error);
    }

    let flush = Request::builder().uri("/logs/flush").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(flush).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let last = Request::builder().uri("/logs/last/4").body(Body::empty()).unwrap();
    let response = app.oneshot(last).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: LastLogsResponse = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body.logs.len(), 4);
    assert!(body.logs[0].starts_with("[ERROR]: event 2 - "));
    assert!(body.logs[3].starts_with("[ERROR]: event 5 - "));

    sink.close().await.unwrap();
}
