use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Update, UpdateType};

pub async fn list(pool: &PgPool) -> Result<Vec<Update>, sqlx::Error> {
    sqlx::query_as::<_, Update>("SELECT * FROM updates ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// Updates on the client's projects plus project-less (broadcast) updates.
pub async fn list_for_client(pool: &PgPool, client_id: Uuid) -> Result<Vec<Update>, sqlx::Error> {
    sqlx::query_as::<_, Update>(
        "SELECT u.* FROM updates u
         LEFT JOIN projects p ON p.id = u.project_id
         WHERE u.project_id IS NULL OR p.client_id = $1
         ORDER BY u.created_at DESC",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await
}

pub async fn list_for_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Update>, sqlx::Error> {
    sqlx::query_as::<_, Update>(
        "SELECT * FROM updates WHERE project_id = $1 ORDER BY created_at DESC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    title: &str,
    content: &str,
    update_type: UpdateType,
    project_id: Option<Uuid>,
    author_id: Uuid,
) -> Result<Update, sqlx::Error> {
    sqlx::query_as::<_, Update>(
        "INSERT INTO updates (title, content, type, project_id, author_id)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(title)
    .bind(content)
    .bind(update_type)
    .bind(project_id)
    .bind(author_id)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Update>, sqlx::Error> {
    sqlx::query_as::<_, Update>("SELECT * FROM updates WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    title: Option<&str>,
    content: Option<&str>,
    update_type: Option<UpdateType>,
) -> Result<Update, sqlx::Error> {
    sqlx::query_as::<_, Update>(
        "UPDATE updates SET
            title = COALESCE($2, title),
            content = COALESCE($3, content),
            type = COALESCE($4, type),
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(title)
    .bind(content)
    .bind(update_type)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM updates WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
