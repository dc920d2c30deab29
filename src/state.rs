use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::access::{AccessEvaluator, PgDirectory};
use crate::config::cors::CorsConfig;
use crate::config::database::init_db_pool;
use crate::config::jwt::JwtConfig;
use crate::config::rate_limit::RateLimitConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub access: AccessEvaluator<PgDirectory>,
    pub started_at: DateTime<Utc>,
}

pub async fn init_app_state() -> AppState {
    let db = init_db_pool().await;
    AppState {
        access: AccessEvaluator::new(PgDirectory::new(db.clone())),
        db,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        rate_limit_config: RateLimitConfig::from_env(),
        started_at: Utc::now(),
    }
}
