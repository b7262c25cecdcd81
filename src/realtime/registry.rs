use std::collections::HashMap;

use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type ConnectionSender = mpsc::UnboundedSender<Message>;

/// A single registered WebSocket connection.
struct Connection {
    /// The user room this connection joined, if any. Set by an explicit
    /// `join` message from the client; the claim is not authenticated.
    user_id: Option<Uuid>,
    sender: ConnectionSender,
}

/// All active WebSocket connections, keyed by connection id.
///
/// Thread-safe via interior `RwLock`; wrapped in `Arc` on the app state and
/// shared between the WebSocket handler and the mutation routes.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<Uuid, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection and return the receiver half of its
    /// outbound channel.
    pub async fn add(&self, conn_id: Uuid) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Connection {
            user_id: None,
            sender: tx,
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Associate a connection with a user room.
    pub async fn join(&self, conn_id: Uuid, user_id: Uuid) {
        if let Some(conn) = self.connections.write().await.get_mut(&conn_id) {
            conn.user_id = Some(user_id);
        }
    }

    pub async fn remove(&self, conn_id: Uuid) {
        self.connections.write().await.remove(&conn_id);
    }

    /// Send a message to every connected socket.
    ///
    /// Connections whose channels are closed are skipped; they are cleaned
    /// up when their receive loop exits.
    pub async fn broadcast(&self, message: Message) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Send a message to every connection in a user's room.
    ///
    /// Returns the number of connections the message was delivered to.
    pub async fn send_to_user(&self, user_id: Uuid, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn.user_id == Some(user_id) {
                let _ = conn.sender.send(message.clone());
                count += 1;
            }
        }
        count
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of connections currently joined to a user's room.
    pub async fn joined_count(&self, user_id: Uuid) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| conn.user_id == Some(user_id))
            .count()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
