use sqlx::PgPool;
use uuid::Uuid;

/// Writes an activity row to `system_logs`. Failures are logged and swallowed:
/// auditing never fails the request that triggered it.
pub async fn record(
    pool: &PgPool,
    user_id: Option<Uuid>,
    action: &str,
    resource_type: Option<&str>,
    resource_id: Option<Uuid>,
    details: serde_json::Value,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO system_logs (user_id, action, resource_type, resource_id, details)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(action)
    .bind(resource_type)
    .bind(resource_id)
    .bind(details)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(error = %e, action, "failed to write audit log entry");
    }
}
