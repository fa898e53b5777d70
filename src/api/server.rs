//! API server module
//!
//! HTTP server that answers log queries against the shared sink.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use super::{ErrorResponse, LastLogsResponse, MessageResponse};
use crate::logging::{LogSink, SinkError};

/// Handle to control the running server
pub struct ServerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    addr: SocketAddr,
}

impl ServerHandle {
    /// Get the address the server is listening on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shutdown the server gracefully
    pub fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            // Ignore error if receiver is already dropped
            let _ = tx.send(());
        }
        Ok(())
    }
}

/// Build the router for `sink`
pub fn router(sink: Arc<LogSink>) -> Router {
    Router::new()
        .route("/logs/last/:count", get(last_handler))
        .route("/logs/flush", get(flush_handler))
        .route("/echo", get(echo_handler))
        .with_state(sink)
}

/// Start the API server
///
/// # Arguments
/// * `port` - Port to listen on (0 picks a free port)
/// * `sink` - Shared log sink
///
/// # Returns
/// A `ServerHandle` that can be used to shut down the server
pub async fn start(port: u16, sink: Arc<LogSink>) -> Result<ServerHandle> {
    let app = router(sink);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("API server listening on {}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
                info!("API server shutting down");
            })
            .await
            .ok();
    });

    Ok(ServerHandle {
        shutdown_tx: Some(shutdown_tx),
        addr: bound_addr,
    })
}

fn sink_failure(e: SinkError) -> Response {
    error!("Log request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

/// GET /logs/last/:count handler
async fn last_handler(State(sink): State<Arc<LogSink>>, Path(count): Path<usize>) -> Response {
    debug!(count, "Tail requested");

    match sink.get_last(count).await {
        Ok(logs) => Json(LastLogsResponse { logs }).into_response(),
        Err(e) => sink_failure(e),
    }
}

/// GET /logs/flush handler
async fn flush_handler(State(sink): State<Arc<LogSink>>) -> Response {
    match sink.flush().await {
        Ok(written) => Json(MessageResponse {
            message: "Logs flushed".to_string(),
            written: Some(written),
        })
        .into_response(),
        Err(e) => sink_failure(e),
    }
}

/// GET /echo handler
async fn echo_handler() -> Json<MessageResponse> {
    Json(MessageResponse::new("Service is up"))
}
