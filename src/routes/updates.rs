use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{ProjectSummary, Update, UpdateType, UserSummary};
use crate::routes::{self, non_empty, parse_enum, require};
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub update_type: Option<String>,
    pub project_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub update_type: Option<String>,
}

/// An update with its author block and, when tied to a project, the
/// `{id, name}` project block.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateView {
    #[serde(flatten)]
    pub update: Update,
    pub author: Option<UserSummary>,
    pub project: Option<ProjectSummary>,
}

/// Attach the author and project blocks to a set of updates.
pub(crate) async fn with_related(
    pool: &PgPool,
    updates: Vec<Update>,
) -> Result<Vec<UpdateView>, AppError> {
    let users = routes::user_summaries(pool, updates.iter().map(|u| u.author_id)).await?;
    let projects =
        routes::project_summaries(pool, updates.iter().filter_map(|u| u.project_id)).await?;

    Ok(updates
        .into_iter()
        .map(|update| UpdateView {
            author: users.get(&update.author_id).cloned(),
            project: update.project_id.and_then(|id| projects.get(&id).cloned()),
            update,
        })
        .collect())
}

async fn view_one(pool: &PgPool, update: Update) -> Result<UpdateView, AppError> {
    with_related(pool, vec![update])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("update view produced no row".to_string()))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Value>, AppError> {
    let updates = if auth.is_client() {
        db::updates::list_for_client(&state.pool, auth.user_id).await?
    } else {
        db::updates::list(&state.pool).await?
    };
    let updates = with_related(&state.pool, updates).await?;
    Ok(Json(json!({ "updates": updates })))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateUpdate>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut errors = Vec::new();

    let title =
        require("title", req.title, &mut errors).map(|t| non_empty("title", &t, &mut errors));
    let content = require("content", req.content, &mut errors)
        .map(|c| non_empty("content", &c, &mut errors));
    let update_type = require("type", req.update_type, &mut errors)
        .and_then(|t| parse_enum::<UpdateType>("type", &t, &mut errors));

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let update = db::updates::create(
        &state.pool,
        &title.unwrap_or_default(),
        &content.unwrap_or_default(),
        update_type.unwrap_or(UpdateType::General),
        req.project_id,
        auth.user_id,
    )
    .await?;

    let update = view_one(&state.pool, update).await?;
    Ok((StatusCode::CREATED, Json(json!({ "update": update }))))
}

pub async fn update(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUpdate>,
) -> Result<Json<Value>, AppError> {
    let mut errors = Vec::new();

    let title = req.title.map(|t| non_empty("title", &t, &mut errors));
    let content = req.content.map(|c| non_empty("content", &c, &mut errors));
    let update_type = req
        .update_type
        .and_then(|t| parse_enum::<UpdateType>("type", &t, &mut errors));

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let update = db::updates::update(
        &state.pool,
        id,
        title.as_deref(),
        content.as_deref(),
        update_type,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Update not found".to_string()),
        _ => AppError::Database(e),
    })?;

    let update = view_one(&state.pool, update).await?;
    Ok(Json(json!({ "update": update })))
}

/// Only the author or an admin may delete an update.
pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let update = db::updates::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Update not found".to_string()))?;

    if update.author_id != auth.user_id && !auth.role.is_admin() {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    db::updates::delete(&state.pool, id).await?;

    Ok(Json(json!({ "message": "Update deleted successfully" })))
}
