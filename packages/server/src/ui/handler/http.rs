//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::ui::state::AppState;

/// Landing endpoint; confirms the service is up.
pub async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "message": "Pollroom server is running",
    }))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint to get current session state (for testing purposes)
pub async fn debug_session(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.coordinator.debug_snapshot().await)
}
