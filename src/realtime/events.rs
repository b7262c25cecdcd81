use axum::extract::ws::Message;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::Notification;
use crate::realtime::ConnectionRegistry;

pub const TICKET_UPDATE: &str = "ticket_update";
pub const PROJECT_UPDATE: &str = "project_update";
pub const NOTIFICATION: &str = "notification";

/// Wrap an event payload in the wire envelope the front end subscribes to.
pub fn envelope(event: &str, data: Value) -> Message {
    Message::Text(json!({ "event": event, "data": data }).to_string().into())
}

/// Push a notification to the owning user's room.
pub async fn send_notification(
    registry: &ConnectionRegistry,
    user_id: Uuid,
    notification: &Notification,
) -> usize {
    let message = envelope(NOTIFICATION, json!(notification));
    registry.send_to_user(user_id, message).await
}

/// Send a project event to the project's client and manager rooms.
///
/// Returns the number of connections reached, or zero when the project does
/// not exist.
pub async fn send_project_update(
    pool: &PgPool,
    registry: &ConnectionRegistry,
    project_id: Uuid,
    data: Value,
) -> Result<usize, sqlx::Error> {
    let Some(project) = db::projects::find_by_id(pool, project_id).await? else {
        return Ok(0);
    };

    let message = envelope(PROJECT_UPDATE, data);
    let mut delivered = registry
        .send_to_user(project.client_id, message.clone())
        .await;
    if let Some(manager_id) = project.manager_id {
        delivered += registry.send_to_user(manager_id, message).await;
    }
    Ok(delivered)
}

/// Send a ticket event to the ticket's client and assignee rooms.
///
/// This is the correctly-scoped counterpart of the global broadcast the
/// ticket routes perform today; the routes do not call it yet.
pub async fn send_ticket_update(
    pool: &PgPool,
    registry: &ConnectionRegistry,
    ticket_id: Uuid,
    data: Value,
) -> Result<usize, sqlx::Error> {
    let Some(ticket) = db::tickets::find_by_id(pool, ticket_id).await? else {
        return Ok(0);
    };

    let message = envelope(TICKET_UPDATE, data);
    let mut delivered = registry.send_to_user(ticket.client_id, message.clone()).await;
    if let Some(assignee_id) = ticket.assigned_to {
        delivered += registry.send_to_user(assignee_id, message).await;
    }
    Ok(delivered)
}
