//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{config::AllowedOrigins, usecase::SessionCoordinator};

use super::{
    handler::{debug_session, health_check, index, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Classroom polling server
///
/// This struct encapsulates the server configuration and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(coordinator, AllowedOrigins::Any);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// SessionCoordinator（セッション操作の窓口）
    coordinator: SessionCoordinator,
    /// CORS origin policy for browser clients
    allowed_origins: AllowedOrigins,
}

impl Server {
    pub fn new(coordinator: SessionCoordinator, allowed_origins: AllowedOrigins) -> Self {
        Self {
            coordinator,
            allowed_origins,
        }
    }

    /// Run the polling server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState {
            coordinator: self.coordinator,
        });

        // Define handlers
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/", get(index))
            .route("/api/health", get(health_check))
            .route("/debug/session", get(debug_session))
            .layer(self.allowed_origins.to_cors_layer())
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!(
            "Classroom polling server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
