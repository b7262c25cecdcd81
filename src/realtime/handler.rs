use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::realtime::ConnectionRegistry;
use crate::state::SharedState;

/// Messages a client may send over the socket. The only one today is the
/// explicit room join; anything else is ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Join {
        #[serde(rename = "userId")]
        user_id: Uuid,
    },
}

/// HTTP handler that upgrades the connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    let registry = state.realtime.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, registry))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Registers the connection, spawns a sender task forwarding outbound
/// messages from the registry channel, and processes inbound messages on
/// the current task until disconnect.
async fn handle_socket(socket: WebSocket, registry: Arc<ConnectionRegistry>) {
    let conn_id = Uuid::now_v7();
    tracing::debug!(conn_id = %conn_id, "WebSocket connected");

    let mut rx = registry.add(conn_id).await;

    let (mut sink, mut stream) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Join { user_id }) => {
                    registry.join(conn_id, user_id).await;
                    tracing::debug!(conn_id = %conn_id, user_id = %user_id, "Joined user room");
                }
                Err(e) => {
                    tracing::trace!(conn_id = %conn_id, error = %e, "Ignoring unrecognized message");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    registry.remove(conn_id).await;
    send_task.abort();
    tracing::debug!(conn_id = %conn_id, "WebSocket disconnected");
}
