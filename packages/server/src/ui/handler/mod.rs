//! HTTP and WebSocket endpoint handlers.

mod http;
mod websocket;

pub use http::{debug_session, health_check, index};
pub use websocket::websocket_handler;
