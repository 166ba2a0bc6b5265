//! WebSocket connection handler.
//!
//! Each accepted socket gets a server-assigned connection id and an
//! unbounded outbound channel. Inbound frames are parsed into
//! [`ClientEvent`]s and handed to the coordinator; everything the
//! coordinator wants delivered comes back through the channel.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use pollroom_shared::protocol::ClientEvent;

use crate::{domain::ConnectionId, ui::state::AppState};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that drains the outbound channel into the WebSocket
/// sink. The task ends when the channel is closed, which is how the
/// coordinator force-disconnects a removed student.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::generate();
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection and hand it to the pusher
    let (tx, rx) = mpsc::unbounded_channel();
    state.coordinator.connection_opened(connection_id, tx).await;
    tracing::info!("Connection '{}' established", connection_id);

    let coordinator = state.coordinator.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received from '{}': {}", connection_id, text);
                    match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => coordinator.dispatch(connection_id, event).await,
                        Err(e) => {
                            // Unknown types and malformed JSON are
                            // logged and dropped; the connection stays
                            // open.
                            tracing::warn!(
                                "Unparseable frame from '{}': {}",
                                connection_id,
                                e
                            );
                        }
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping from '{}'", connection_id);
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task that pushes coordinator deliveries to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.coordinator.connection_closed(connection_id).await;
}
