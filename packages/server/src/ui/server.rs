//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        add_queue_item, clear_queue, get_clients, get_now_playing, get_queue, health_check,
        issue_playback_command, post_chat, remove_queue_item, update_backend, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Local relay and HTTP API server
///
/// ```ignore
/// let server = Server::new(app_state);
/// server.run("127.0.0.1", 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route(
                "/api/queue",
                get(get_queue).post(add_queue_item).delete(clear_queue),
            )
            .route("/api/queue/{index}", delete(remove_queue_item))
            .route("/api/now-playing", get(get_now_playing))
            .route("/api/clients", get(get_clients))
            .route("/api/playback/backend", put(update_backend))
            .route("/api/playback/{command}", post(issue_playback_command))
            .route("/api/chat", post(post_chat))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind and serve until Ctrl+C / SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound. No other port is tried.
    pub async fn run(self, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Encore relay listening on {}", listener.local_addr()?);
        tracing::info!("Bridges connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
