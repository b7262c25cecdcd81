use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::routes::non_empty;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    let users: Vec<User> = db::users::list(&state.pool).await?;
    Ok(Json(serde_json::json!({ "users": users })))
}

pub async fn profile(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(serde_json::json!({ "user": user })))
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateProfile>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut errors = Vec::new();
    let name = req.name.map(|n| non_empty("name", &n, &mut errors));
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let user = db::users::update_profile(
        &state.pool,
        auth.user_id,
        name.as_deref(),
        req.company.as_deref(),
        req.phone.as_deref(),
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("User not found".to_string()),
        _ => AppError::Database(e),
    })?;

    Ok(Json(serde_json::json!({ "user": user })))
}
