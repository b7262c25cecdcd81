use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Comment;

pub async fn create(
    pool: &PgPool,
    content: &str,
    ticket_id: Uuid,
    author_id: Uuid,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "INSERT INTO comments (content, ticket_id, author_id) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(content)
    .bind(ticket_id)
    .bind(author_id)
    .fetch_one(pool)
    .await
}

/// Comments for a set of tickets in one round trip, newest first.
pub async fn list_for_tickets(
    pool: &PgPool,
    ticket_ids: &[Uuid],
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE ticket_id = ANY($1) ORDER BY created_at DESC",
    )
    .bind(ticket_ids)
    .fetch_all(pool)
    .await
}
