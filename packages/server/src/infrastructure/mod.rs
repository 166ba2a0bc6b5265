//! Infrastructure layer: concrete implementations of the interfaces
//! the domain defines, plus DTO conversions.

pub mod dto;
pub mod message_pusher;

pub use message_pusher::WebSocketMessagePusher;
