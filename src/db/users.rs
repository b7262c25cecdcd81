use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ClientSummary, Role, User, UserSummary};

pub async fn create(
    pool: &PgPool,
    email: &str,
    name: &str,
    role: Role,
    company: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, name, role, company) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(email)
    .bind(name)
    .bind(role)
    .bind(company)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// The `{id, name, email}` blocks for a set of users in one round trip.
pub async fn summaries(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>("SELECT id, name, email FROM users WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
}

pub async fn client_summary(pool: &PgPool, id: Uuid) -> Result<Option<ClientSummary>, sqlx::Error> {
    sqlx::query_as::<_, ClientSummary>(
        "SELECT id, name, email, company FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    company: Option<&str>,
    phone: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET
            name = COALESCE($2, name),
            company = COALESCE($3, company),
            phone = COALESCE($4, phone)
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(company)
    .bind(phone)
    .fetch_one(pool)
    .await
}
