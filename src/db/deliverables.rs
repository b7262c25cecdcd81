use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Deliverable, DeliverableStatus, DeliverableSummary};

/// Partial field set for deliverable updates. `None` leaves the column
/// unchanged. A COMPLETED status stamps `completed_at` with now() even when
/// the row is already COMPLETED (re-stamps are intentional behavior).
#[derive(Debug, Default)]
pub struct DeliverableChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<DeliverableStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
}

pub async fn list(pool: &PgPool) -> Result<Vec<Deliverable>, sqlx::Error> {
    sqlx::query_as::<_, Deliverable>("SELECT * FROM deliverables ORDER BY due_date ASC")
        .fetch_all(pool)
        .await
}

/// Deliverables reachable from the client's projects, due date ascending.
pub async fn list_for_client(
    pool: &PgPool,
    client_id: Uuid,
) -> Result<Vec<Deliverable>, sqlx::Error> {
    sqlx::query_as::<_, Deliverable>(
        "SELECT d.* FROM deliverables d
         JOIN projects p ON p.id = d.project_id
         WHERE p.client_id = $1
         ORDER BY d.due_date ASC",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await
}

/// The name/status/due-date slices for a set of projects, used by the
/// project list payload.
pub async fn summaries_for_projects(
    pool: &PgPool,
    project_ids: &[Uuid],
) -> Result<Vec<DeliverableSummary>, sqlx::Error> {
    sqlx::query_as::<_, DeliverableSummary>(
        "SELECT project_id, id, name, status, due_date FROM deliverables
         WHERE project_id = ANY($1) ORDER BY due_date ASC",
    )
    .bind(project_ids)
    .fetch_all(pool)
    .await
}

pub async fn list_for_project(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<Deliverable>, sqlx::Error> {
    sqlx::query_as::<_, Deliverable>(
        "SELECT * FROM deliverables WHERE project_id = $1 ORDER BY due_date ASC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    name: &str,
    description: Option<&str>,
    due_date: DateTime<Utc>,
    project_id: Uuid,
    assigned_to: Option<Uuid>,
) -> Result<Deliverable, sqlx::Error> {
    sqlx::query_as::<_, Deliverable>(
        "INSERT INTO deliverables (name, description, due_date, project_id, assigned_to)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(due_date)
    .bind(project_id)
    .bind(assigned_to)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &DeliverableChanges,
) -> Result<Deliverable, sqlx::Error> {
    sqlx::query_as::<_, Deliverable>(
        "UPDATE deliverables SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            status = COALESCE($4, status),
            due_date = COALESCE($5, due_date),
            assigned_to = COALESCE($6, assigned_to),
            completed_at = CASE WHEN $4 = 'COMPLETED' THEN now() ELSE completed_at END,
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(changes.name.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.status)
    .bind(changes.due_date)
    .bind(changes.assigned_to)
    .fetch_one(pool)
    .await
}

/// Unconditional removal, no ownership scoping.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM deliverables WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
