use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use opsdesk::access::{AccessEvaluator, PgDirectory};
use opsdesk::config::cors::CorsConfig;
use opsdesk::config::jwt::JwtConfig;
use opsdesk::config::rate_limit::RateLimitConfig;
use opsdesk::router::init_router;
use opsdesk::state::AppState;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

async fn setup_test_app_with_rate_limit(
    pool: PgPool,
    rate_limit_config: RateLimitConfig,
) -> axum::Router {
    dotenvy::dotenv().ok();
    let state = AppState {
        db: pool.clone(),
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        rate_limit_config,
        access: AccessEvaluator::new(PgDirectory::new(pool)),
        started_at: Utc::now(),
    };
    init_router(state)
}

/// Strict limits: a single auth request per IP before 429.
fn strict_rate_limit_config() -> RateLimitConfig {
    RateLimitConfig {
        general_per_second: 60,
        general_burst_size: 30,
        auth_per_second: 60,
        auth_burst_size: 1,
    }
}

fn login_request(ip: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(
            serde_json::to_string(&json!({
                "email": "test@example.com",
                "password": "password123"
            }))
            .unwrap(),
        ))
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_auth_rate_limit_exceeded(pool: PgPool) {
    let config = strict_rate_limit_config();
    let app = setup_test_app_with_rate_limit(pool.clone(), config).await;

    // First request is processed: rejected credentials, not rate limited.
    let response = app.clone().oneshot(login_request("192.168.1.100")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Second request from the same IP hits the auth limit.
    let response = app.oneshot(login_request("192.168.1.100")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_different_ips_have_separate_limits(pool: PgPool) {
    let config = strict_rate_limit_config();
    let app = setup_test_app_with_rate_limit(pool.clone(), config).await;

    let response = app.clone().oneshot(login_request("10.0.0.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A different IP still has its own budget.
    let response = app.oneshot(login_request("10.0.0.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_general_limit_applies_outside_auth(pool: PgPool) {
    let config = RateLimitConfig {
        general_per_second: 60,
        general_burst_size: 1,
        auth_per_second: 60,
        auth_burst_size: 30,
    };
    let app = setup_test_app_with_rate_limit(pool.clone(), config).await;

    let request = |ip: &str| {
        Request::builder()
            .method("GET")
            .uri("/api/notifications/unread-count")
            .header("x-forwarded-for", ip.to_string())
            .body(Body::empty())
            .unwrap()
    };

    // First request reaches the handler (401: no token), second is limited.
    let response = app.clone().oneshot(request("172.16.0.9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.oneshot(request("172.16.0.9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_health_endpoint_is_not_rate_limited(pool: PgPool) {
    let config = RateLimitConfig {
        general_per_second: 60,
        general_burst_size: 1,
        auth_per_second: 60,
        auth_burst_size: 1,
    };
    let app = setup_test_app_with_rate_limit(pool.clone(), config).await;

    // Health sits outside /api and never sees a limiter.
    for _ in 0..3 {
        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .header("x-forwarded-for", "172.16.0.1")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
