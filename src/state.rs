use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::rate_limit::ApiRateLimiter;
use crate::realtime::ConnectionRegistry;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub realtime: Arc<ConnectionRegistry>,
    pub api_limiter: ApiRateLimiter,
}
