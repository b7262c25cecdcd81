use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::deliverables::DeliverableChanges;
use crate::error::AppError;
use crate::models::{Deliverable, DeliverableStatus, ProjectSummary, UserSummary};
use crate::routes::{self, non_empty, parse_enum, require};
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeliverable {
    pub name: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeliverable {
    pub name: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub assigned_to: Option<Uuid>,
}

/// A deliverable with its assignee block; the cross-project list also
/// carries the `{id, name}` project block.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverableView {
    #[serde(flatten)]
    pub deliverable: Deliverable,
    pub assigned_user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSummary>,
}

/// Attach the assignee (and optionally project) blocks to a set of
/// deliverables.
pub(crate) async fn with_related(
    pool: &PgPool,
    deliverables: Vec<Deliverable>,
    include_project: bool,
) -> Result<Vec<DeliverableView>, AppError> {
    let users =
        routes::user_summaries(pool, deliverables.iter().filter_map(|d| d.assigned_to)).await?;
    let projects = if include_project {
        routes::project_summaries(pool, deliverables.iter().map(|d| d.project_id)).await?
    } else {
        Default::default()
    };

    Ok(deliverables
        .into_iter()
        .map(|deliverable| DeliverableView {
            assigned_user: deliverable
                .assigned_to
                .and_then(|id| users.get(&id).cloned()),
            project: include_project
                .then(|| projects.get(&deliverable.project_id).cloned())
                .flatten(),
            deliverable,
        })
        .collect())
}

async fn view_one(pool: &PgPool, deliverable: Deliverable) -> Result<DeliverableView, AppError> {
    with_related(pool, vec![deliverable], false)
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("deliverable view produced no row".to_string()))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Value>, AppError> {
    let deliverables = if auth.is_client() {
        db::deliverables::list_for_client(&state.pool, auth.user_id).await?
    } else {
        db::deliverables::list(&state.pool).await?
    };
    let deliverables = with_related(&state.pool, deliverables, true).await?;
    Ok(Json(json!({ "deliverables": deliverables })))
}

pub async fn list_for_project(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let project = db::projects::find_by_id(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if auth.is_client() && project.client_id != auth.user_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let deliverables = db::deliverables::list_for_project(&state.pool, project_id).await?;
    let deliverables = with_related(&state.pool, deliverables, false).await?;
    Ok(Json(json!({ "deliverables": deliverables })))
}

pub async fn create(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateDeliverable>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut errors = Vec::new();

    let name = require("name", req.name, &mut errors).map(|n| non_empty("name", &n, &mut errors));
    let due_date = require("dueDate", req.due_date, &mut errors);
    let project_id = require("projectId", req.project_id, &mut errors);

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let deliverable = db::deliverables::create(
        &state.pool,
        &name.unwrap_or_default(),
        req.description.as_deref(),
        due_date.unwrap_or_default(),
        project_id.unwrap_or_default(),
        req.assigned_to,
    )
    .await?;

    let deliverable = view_one(&state.pool, deliverable).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "deliverable": deliverable })),
    ))
}

pub async fn update(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDeliverable>,
) -> Result<Json<Value>, AppError> {
    let mut errors = Vec::new();

    let name = req.name.map(|n| non_empty("name", &n, &mut errors));
    let status = req
        .status
        .and_then(|s| parse_enum::<DeliverableStatus>("status", &s, &mut errors));

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let changes = DeliverableChanges {
        name,
        description: req.description,
        status,
        due_date: req.due_date,
        assigned_to: req.assigned_to,
    };

    let deliverable = db::deliverables::update(&state.pool, id, &changes)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Deliverable not found".to_string()),
            _ => AppError::Database(e),
        })?;

    let deliverable = view_one(&state.pool, deliverable).await?;
    Ok(Json(json!({ "deliverable": deliverable })))
}

/// Deletes are unconditional here: any authenticated caller may remove any
/// deliverable, project ownership is not consulted.
pub async fn delete(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    db::deliverables::delete(&state.pool, id).await?;

    Ok(Json(json!({ "message": "Deliverable deleted successfully" })))
}
