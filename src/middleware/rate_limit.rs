use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::SharedState;

/// Reject callers that exceed the per-IP request budget.
pub async fn enforce(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    state
        .api_limiter
        .check(
            addr.ip(),
            state.config.rate_limit_max,
            state.config.rate_limit_window_secs,
        )
        .map_err(|retry_after| {
            AppError::RateLimited(format!(
                "Too many requests, retry in {retry_after} seconds"
            ))
        })?;

    Ok(next.run(req).await)
}
