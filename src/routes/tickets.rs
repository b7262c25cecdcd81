use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::tickets::TicketChanges;
use crate::error::AppError;
use crate::models::{
    Comment, ProjectSummary, Ticket, TicketCategory, TicketPriority, TicketStatus, UserSummary,
};
use crate::realtime::events;
use crate::routes::{self, non_empty, parse_enum, require};
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicket {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub project_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicket {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct CreateComment {
    pub content: Option<String>,
}

/// A comment with its author's `{id, name, email}` block.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<UserSummary>,
}

/// A ticket with the related user/project blocks the portal pages render.
/// The comment thread is only attached on the list endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub client: Option<UserSummary>,
    pub assigned_user: Option<UserSummary>,
    pub project: Option<ProjectSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentView>>,
}

/// Attach the client/assignee/project blocks (and optionally the grouped
/// comment threads) to a set of tickets.
pub(crate) async fn with_related(
    pool: &PgPool,
    tickets: Vec<Ticket>,
    include_comments: bool,
) -> Result<Vec<TicketView>, AppError> {
    let ticket_ids: Vec<Uuid> = tickets.iter().map(|t| t.id).collect();
    let comments = if include_comments {
        db::comments::list_for_tickets(pool, &ticket_ids).await?
    } else {
        Vec::new()
    };

    let mut user_ids: Vec<Uuid> = tickets.iter().map(|t| t.client_id).collect();
    user_ids.extend(tickets.iter().filter_map(|t| t.assigned_to));
    user_ids.extend(comments.iter().map(|c| c.author_id));
    let users = routes::user_summaries(pool, user_ids).await?;

    let projects =
        routes::project_summaries(pool, tickets.iter().filter_map(|t| t.project_id)).await?;

    let mut threads: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
    for comment in comments {
        let author = users.get(&comment.author_id).cloned();
        threads
            .entry(comment.ticket_id)
            .or_default()
            .push(CommentView { comment, author });
    }

    Ok(tickets
        .into_iter()
        .map(|ticket| TicketView {
            client: users.get(&ticket.client_id).cloned(),
            assigned_user: ticket.assigned_to.and_then(|id| users.get(&id).cloned()),
            project: ticket.project_id.and_then(|id| projects.get(&id).cloned()),
            comments: include_comments.then(|| threads.remove(&ticket.id).unwrap_or_default()),
            ticket,
        })
        .collect())
}

async fn view_one(pool: &PgPool, ticket: Ticket) -> Result<TicketView, AppError> {
    with_related(pool, vec![ticket], false)
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("ticket view produced no row".to_string()))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Value>, AppError> {
    let tickets = if auth.is_client() {
        db::tickets::list_for_client(&state.pool, auth.user_id).await?
    } else {
        db::tickets::list(&state.pool).await?
    };

    let tickets = with_related(&state.pool, tickets, true).await?;
    Ok(Json(json!({ "tickets": tickets })))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateTicket>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut errors = Vec::new();

    let title =
        require("title", req.title, &mut errors).map(|t| non_empty("title", &t, &mut errors));
    let description = require("description", req.description, &mut errors)
        .map(|d| non_empty("description", &d, &mut errors));
    let priority = require("priority", req.priority, &mut errors)
        .and_then(|p| parse_enum::<TicketPriority>("priority", &p, &mut errors));
    let category = require("category", req.category, &mut errors)
        .and_then(|c| parse_enum::<TicketCategory>("category", &c, &mut errors));

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    // The caller is always the ticket's client, whatever the body says.
    let ticket = db::tickets::create(
        &state.pool,
        &title.unwrap_or_default(),
        &description.unwrap_or_default(),
        priority.unwrap_or(TicketPriority::Medium),
        category.unwrap_or(TicketCategory::General),
        req.project_id,
        auth.user_id,
    )
    .await?;

    let ticket = view_one(&state.pool, ticket).await?;

    state
        .realtime
        .broadcast(events::envelope(
            events::TICKET_UPDATE,
            json!({ "type": "created", "ticket": ticket }),
        ))
        .await;

    Ok((StatusCode::CREATED, Json(json!({ "ticket": ticket }))))
}

pub async fn update(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTicket>,
) -> Result<Json<Value>, AppError> {
    let mut errors = Vec::new();

    let title = req.title.map(|t| non_empty("title", &t, &mut errors));
    let description = req
        .description
        .map(|d| non_empty("description", &d, &mut errors));
    let priority = req
        .priority
        .and_then(|p| parse_enum::<TicketPriority>("priority", &p, &mut errors));
    let status = req
        .status
        .and_then(|s| parse_enum::<TicketStatus>("status", &s, &mut errors));

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let changes = TicketChanges {
        title,
        description,
        status,
        priority,
        assigned_to: req.assigned_to,
    };

    let ticket = db::tickets::update(&state.pool, id, &changes)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Ticket not found".to_string()),
            _ => AppError::Database(e),
        })?;

    let ticket = view_one(&state.pool, ticket).await?;

    state
        .realtime
        .broadcast(events::envelope(
            events::TICKET_UPDATE,
            json!({ "type": "updated", "ticket": ticket }),
        ))
        .await;

    Ok(Json(json!({ "ticket": ticket })))
}

pub async fn add_comment(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateComment>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut errors = Vec::new();
    let content = require("content", req.content, &mut errors)
        .map(|c| non_empty("content", &c, &mut errors));
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    db::tickets::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    let comment =
        db::comments::create(&state.pool, &content.unwrap_or_default(), id, auth.user_id).await?;

    let users = routes::user_summaries(&state.pool, [comment.author_id]).await?;
    let comment = CommentView {
        author: users.get(&comment.author_id).cloned(),
        comment,
    };

    state
        .realtime
        .broadcast(events::envelope(
            events::TICKET_UPDATE,
            json!({ "type": "comment_added", "ticketId": id, "comment": comment }),
        ))
        .await;

    Ok((StatusCode::CREATED, Json(json!({ "comment": comment }))))
}
