//! HTTP receive surface

pub mod write;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::core::config::ServerConfig;
use crate::core::shutdown::ShutdownService;
use crate::wire::WriteRequest;
use write::WriteState;

pub struct ApiServer {
    config: ServerConfig,
    queue: mpsc::Sender<WriteRequest>,
    shutdown: ShutdownService,
}

impl ApiServer {
    pub fn new(
        config: ServerConfig,
        queue: mpsc::Sender<WriteRequest>,
        shutdown: ShutdownService,
    ) -> Self {
        Self {
            config,
            queue,
            shutdown,
        }
    }

    /// Bind and serve until shutdown is signalled.
    pub async fn start(self) -> Result<()> {
        let router = Self::router(self.queue.clone());

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        tracing::info!(addr = %addr, "HTTP server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(self.shutdown.wait())
            .await
            .context("HTTP server error")?;

        Ok(())
    }

    fn router(queue: mpsc::Sender<WriteRequest>) -> Router {
        Router::new()
            .route("/api/v1/write", post(write::receive))
            .route("/health", get(health))
            .layer(TraceLayer::new_for_http())
            .with_state(WriteState { queue })
    }
}

async fn health() -> &'static str {
    "ok"
}
