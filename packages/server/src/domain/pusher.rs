//! MessagePusher trait 定義
//!
//! ドメイン層が必要とするメッセージ通知のインターフェースを定義します。
//! 具体的な実装（WebSocket）は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::value_object::ConnectionId;

/// Per-connection outbound channel. The UI layer creates the channel
/// when a WebSocket is accepted; the pusher only sends into it.
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[derive(Debug, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Delivery abstraction used by the session coordinator.
///
/// The coordinator only ever decides an audience (everyone, a list
/// of connections, or a single caller) and hands the serialized
/// frame here. Transport details stay out of the domain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register a client's outbound channel.
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// Drop a client's outbound channel. Closing the channel tears
    /// down the client's socket task.
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// Send to a single connection.
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// Send to the given connections. Partial delivery failures are
    /// tolerated and logged.
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// Send to every connected client.
    async fn broadcast_all(&self, content: &str) -> Result<(), MessagePushError>;
}
