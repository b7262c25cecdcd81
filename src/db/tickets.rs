use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Ticket, TicketCategory, TicketPriority, TicketStatus, TicketSummary};

/// Partial field set for ticket updates. `None` leaves the column unchanged.
#[derive(Debug, Default)]
pub struct TicketChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assigned_to: Option<Uuid>,
}

pub async fn list(pool: &PgPool) -> Result<Vec<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn list_for_client(pool: &PgPool, client_id: Uuid) -> Result<Vec<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "SELECT * FROM tickets WHERE client_id = $1 ORDER BY created_at DESC",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await
}

pub async fn list_for_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "SELECT * FROM tickets WHERE project_id = $1 ORDER BY created_at DESC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// The title/status/priority slices for a set of projects, used by the
/// project list payload.
pub async fn summaries_for_projects(
    pool: &PgPool,
    project_ids: &[Uuid],
) -> Result<Vec<TicketSummary>, sqlx::Error> {
    sqlx::query_as::<_, TicketSummary>(
        "SELECT project_id, id, title, status, priority FROM tickets
         WHERE project_id = ANY($1) ORDER BY created_at DESC",
    )
    .bind(project_ids)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    title: &str,
    description: &str,
    priority: TicketPriority,
    category: TicketCategory,
    project_id: Option<Uuid>,
    client_id: Uuid,
) -> Result<Ticket, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "INSERT INTO tickets (title, description, priority, category, project_id, client_id)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(title)
    .bind(description)
    .bind(priority)
    .bind(category)
    .bind(project_id)
    .bind(client_id)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(pool: &PgPool, id: Uuid, changes: &TicketChanges) -> Result<Ticket, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "UPDATE tickets SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            status = COALESCE($4, status),
            priority = COALESCE($5, priority),
            assigned_to = COALESCE($6, assigned_to),
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(changes.title.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.status)
    .bind(changes.priority)
    .bind(changes.assigned_to)
    .fetch_one(pool)
    .await
}
