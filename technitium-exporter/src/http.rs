//! HTTP server for Prometheus metrics endpoint.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::client::{HttpTransport, Transport};
use crate::collector::SharedCollector;
use crate::exposition::render;

/// Application state shared across handlers.
struct AppState<T: Transport> {
    collector: SharedCollector<T>,
}

impl<T: Transport> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            collector: self.collector.clone(),
        }
    }
}

/// Create the HTTP router.
fn create_router<T: Transport + 'static>(
    collector: SharedCollector<T>,
    metrics_path: &str,
) -> Router {
    let state = AppState { collector };

    Router::new()
        .route(metrics_path, get(metrics_handler::<T>))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler::<T>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the metrics endpoint. Always answers 200.
async fn metrics_handler<T: Transport + 'static>(State(state): State<AppState<T>>) -> Response {
    let samples = state.collector.collect().await;
    let body = render(
        &samples,
        &state.collector.stats(),
        state.collector.context(),
    );

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// Handler for the /ready endpoint.
async fn ready_handler<T: Transport + 'static>(State(state): State<AppState<T>>) -> Response {
    if state.collector.stats().last_scrape_up {
        (StatusCode::OK, "ready\n").into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "not ready - Technitium API not reached by the last scrape\n",
        )
            .into_response()
    }
}

/// HTTP server configuration.
pub struct HttpServer<T: Transport = HttpTransport> {
    collector: SharedCollector<T>,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl<T: Transport + 'static> HttpServer<T> {
    /// Create a new HTTP server.
    pub fn new(
        collector: SharedCollector<T>,
        listen_addr: SocketAddr,
        metrics_path: String,
    ) -> Self {
        Self {
            collector,
            listen_addr,
            metrics_path,
        }
    }

    /// Bind the listen address and serve until the shutdown signal is received.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let addr = listener.local_addr().unwrap_or(self.listen_addr);
        let router = create_router(self.collector, &self.metrics_path);

        info!(
            addr = %addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        // Run server with graceful shutdown
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
