//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::handler::http::{health_check, issue_token};
use super::handler::websocket::{call_websocket_handler, chat_websocket_handler};
use super::state::AppState;

/// Room coordination server over axum.
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server from pre-built application state.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Run the server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = Self::router(self.state);

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Room coordination server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Chat rooms:  ws://{}/ws/chat/{{room_id}}", bind_addr);
        tracing::info!("Call rooms:  ws://{}/ws/call/{{room_id}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Build the router. Exposed separately so integration tests can mount
    /// the app without binding a socket.
    pub fn router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/ws/chat/{room_id}", get(chat_websocket_handler))
            .route("/ws/call/{room_id}", get(call_websocket_handler))
            .route("/rooms/{room_id}/token", post(issue_token))
            .route("/health", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
