use std::collections::HashMap;

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
use crate::db::projects::ProjectChanges;
use crate::error::{AppError, FieldError};
use crate::models::{
    ClientSummary, DeliverableSummary, Project, ProjectStatus, TicketSummary, UserSummary,
};
use crate::routes::{self, deliverables, non_empty, parse_enum, require, tickets, updates};
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub client_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub manager_id: Option<Uuid>,
}

/// A project with its client/manager blocks; the list endpoint also
/// attaches the deliverable and ticket slices the projects page renders.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub client: Option<UserSummary>,
    pub manager: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliverables: Option<Vec<DeliverableSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickets: Option<Vec<TicketSummary>>,
}

/// The detail payload: the project, its people, and every related record
/// with its own embedded blocks.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub client: Option<ClientSummary>,
    pub manager: Option<UserSummary>,
    pub deliverables: Vec<deliverables::DeliverableView>,
    pub tickets: Vec<tickets::TicketView>,
    pub updates: Vec<updates::UpdateView>,
}

/// Attach the client and manager blocks to a single project.
async fn with_people(pool: &PgPool, project: Project) -> Result<ProjectView, AppError> {
    let mut ids = vec![project.client_id];
    ids.extend(project.manager_id);
    let users = routes::user_summaries(pool, ids).await?;

    Ok(ProjectView {
        client: users.get(&project.client_id).cloned(),
        manager: project.manager_id.and_then(|id| users.get(&id).cloned()),
        deliverables: None,
        tickets: None,
        project,
    })
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Value>, AppError> {
    let projects = if auth.is_client() {
        db::projects::list_for_client(&state.pool, auth.user_id).await?
    } else {
        db::projects::list(&state.pool).await?
    };

    let mut user_ids: Vec<Uuid> = projects.iter().map(|p| p.client_id).collect();
    user_ids.extend(projects.iter().filter_map(|p| p.manager_id));
    let users = routes::user_summaries(&state.pool, user_ids).await?;

    let project_ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
    let mut deliverable_slices: HashMap<Uuid, Vec<DeliverableSummary>> = HashMap::new();
    for d in db::deliverables::summaries_for_projects(&state.pool, &project_ids).await? {
        deliverable_slices.entry(d.project_id).or_default().push(d);
    }
    let mut ticket_slices: HashMap<Uuid, Vec<TicketSummary>> = HashMap::new();
    for t in db::tickets::summaries_for_projects(&state.pool, &project_ids).await? {
        ticket_slices.entry(t.project_id).or_default().push(t);
    }

    let projects: Vec<ProjectView> = projects
        .into_iter()
        .map(|project| ProjectView {
            client: users.get(&project.client_id).cloned(),
            manager: project.manager_id.and_then(|id| users.get(&id).cloned()),
            deliverables: Some(deliverable_slices.remove(&project.id).unwrap_or_default()),
            tickets: Some(ticket_slices.remove(&project.id).unwrap_or_default()),
            project,
        })
        .collect();

    Ok(Json(json!({ "projects": projects })))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateProject>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut errors = Vec::new();

    let name = require("name", req.name, &mut errors).map(|n| non_empty("name", &n, &mut errors));
    let start_date = require("startDate", req.start_date, &mut errors);
    if let Some(budget) = req.budget {
        if budget < 0.0 {
            errors.push(FieldError::new("budget", "must not be negative"));
        }
    }

    // Clients always own what they create; staff must say who the client is.
    let client_id = if auth.is_client() {
        Some(auth.user_id)
    } else {
        require("clientId", req.client_id, &mut errors)
    };

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let project = db::projects::create(
        &state.pool,
        &name.unwrap_or_default(),
        req.description.as_deref(),
        start_date.unwrap_or_default(),
        req.end_date,
        req.budget,
        client_id.unwrap_or_default(),
        req.manager_id,
    )
    .await?;

    let project = with_people(&state.pool, project).await?;
    Ok((StatusCode::CREATED, Json(json!({ "project": project }))))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let project = find_accessible(&state, &auth, id).await?;

    let client = db::users::client_summary(&state.pool, project.client_id).await?;
    let manager = match project.manager_id {
        Some(manager_id) => {
            let users = routes::user_summaries(&state.pool, [manager_id]).await?;
            users.get(&manager_id).cloned()
        }
        None => None,
    };

    let deliverable_rows = db::deliverables::list_for_project(&state.pool, id).await?;
    let deliverables =
        deliverables::with_related(&state.pool, deliverable_rows, false).await?;
    let ticket_rows = db::tickets::list_for_project(&state.pool, id).await?;
    let tickets = tickets::with_related(&state.pool, ticket_rows, false).await?;
    let update_rows = db::updates::list_for_project(&state.pool, id).await?;
    let updates = updates::with_related(&state.pool, update_rows).await?;

    let project = ProjectDetail {
        client,
        manager,
        deliverables,
        tickets,
        updates,
        project,
    };

    Ok(Json(json!({ "project": project })))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProject>,
) -> Result<Json<Value>, AppError> {
    find_accessible(&state, &auth, id).await?;

    let mut errors = Vec::new();
    let name = req.name.map(|n| non_empty("name", &n, &mut errors));
    let status = req
        .status
        .and_then(|s| parse_enum::<ProjectStatus>("status", &s, &mut errors));
    if let Some(budget) = req.budget {
        if budget < 0.0 {
            errors.push(FieldError::new("budget", "must not be negative"));
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let changes = ProjectChanges {
        name,
        description: req.description,
        status,
        start_date: req.start_date,
        end_date: req.end_date,
        budget: req.budget,
        manager_id: req.manager_id,
    };

    let project = db::projects::update(&state.pool, id, &changes)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Project not found".to_string()),
            _ => AppError::Database(e),
        })?;

    let project = with_people(&state.pool, project).await?;
    Ok(Json(json!({ "project": project })))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    find_accessible(&state, &auth, id).await?;

    db::projects::delete(&state.pool, id).await?;

    Ok(Json(json!({ "message": "Project deleted successfully" })))
}

/// Look up a project and enforce the client ownership rule: 404 when it does
/// not exist, 403 when a CLIENT caller does not own it.
async fn find_accessible(
    state: &SharedState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<Project, AppError> {
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if auth.is_client() && project.client_id != auth.user_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    Ok(project)
}
