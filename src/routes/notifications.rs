use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::Notification;
use crate::state::SharedState;

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let notifications: Vec<Notification> =
        db::notifications::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "notifications": notifications })))
}

pub async fn mark_read(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let notification = db::notifications::mark_read(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
    Ok(Json(serde_json::json!({ "notification": notification })))
}

pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    db::notifications::mark_all_read(&state.pool, auth.user_id).await?;
    Ok(Json(
        serde_json::json!({ "message": "All notifications marked as read" }),
    ))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = db::notifications::delete(&state.pool, id, auth.user_id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(Json(
        serde_json::json!({ "message": "Notification deleted successfully" }),
    ))
}
