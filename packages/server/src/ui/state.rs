//! Shared application state for the HTTP/WebSocket handlers.

use crate::usecase::SessionCoordinator;

/// Shared application state
pub struct AppState {
    /// SessionCoordinator（セッション操作の窓口）
    pub coordinator: SessionCoordinator,
}
