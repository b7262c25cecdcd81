pub mod deliverables;
pub mod notifications;
pub mod projects;
pub mod tickets;
pub mod updates;
pub mod users;

use std::collections::HashMap;

use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::FieldError;
use crate::models::{ProjectSummary, UserSummary};
use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Projects
        .route("/api/projects", get(projects::list).post(projects::create))
        .route(
            "/api/projects/{id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        // Deliverables
        .route(
            "/api/deliverables",
            get(deliverables::list).post(deliverables::create),
        )
        .route(
            "/api/deliverables/project/{project_id}",
            get(deliverables::list_for_project),
        )
        .route(
            "/api/deliverables/{id}",
            put(deliverables::update).delete(deliverables::delete),
        )
        // Tickets
        .route("/api/tickets", get(tickets::list).post(tickets::create))
        .route("/api/tickets/{id}", put(tickets::update))
        .route("/api/tickets/{id}/comments", post(tickets::add_comment))
        // Updates
        .route("/api/updates", get(updates::list).post(updates::create))
        .route(
            "/api/updates/{id}",
            put(updates::update).delete(updates::delete),
        )
        // Notifications
        .route("/api/notifications", get(notifications::list))
        .route(
            "/api/notifications/read-all",
            put(notifications::mark_all_read),
        )
        .route("/api/notifications/{id}/read", put(notifications::mark_read))
        .route("/api/notifications/{id}", delete(notifications::delete))
        // Users
        .route("/api/users", get(users::list))
        .route(
            "/api/users/profile",
            get(users::profile).put(users::update_profile),
        )
}

/// Batch-load the `{id, name, email}` user blocks embedded in responses,
/// keyed by user id.
pub(crate) async fn user_summaries(
    pool: &PgPool,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, UserSummary>, sqlx::Error> {
    let ids: Vec<Uuid> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = db::users::summaries(pool, &ids).await?;
    Ok(rows.into_iter().map(|u| (u.id, u)).collect())
}

/// Batch-load the `{id, name}` project blocks embedded in responses, keyed
/// by project id.
pub(crate) async fn project_summaries(
    pool: &PgPool,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, ProjectSummary>, sqlx::Error> {
    let ids: Vec<Uuid> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = db::projects::summaries(pool, &ids).await?;
    Ok(rows.into_iter().map(|p| (p.id, p)).collect())
}

/// Record a field error when a required value is missing, passing the value
/// through otherwise.
pub(crate) fn require<T>(
    field: &'static str,
    value: Option<T>,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    if value.is_none() {
        errors.push(FieldError::new(field, "is required"));
    }
    value
}

/// Trim a string field and record an error when it is empty.
pub(crate) fn non_empty(
    field: &'static str,
    value: &str,
    errors: &mut Vec<FieldError>,
) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, "must not be empty"));
    }
    trimmed.to_string()
}

/// Parse a string into one of an enum's wire values, recording a field error
/// on anything outside the allowed set.
pub(crate) fn parse_enum<T: DeserializeOwned>(
    field: &'static str,
    value: &str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match serde_json::from_value(Value::String(value.to_string())) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.push(FieldError::new(field, format!("invalid value '{value}'")));
            None
        }
    }
}
