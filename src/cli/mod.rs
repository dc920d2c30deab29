use sqlx::PgPool;
use uuid::Uuid;

use crate::utils::password::hash_password;

/// Creates the owner account. Owners cannot be created through the API, so
/// this runs from the `create-owner` command handled in `main`.
pub async fn create_owner(
    db: &PgPool,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let hashed_password =
        hash_password(password).map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let role_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM roles WHERE level = 1")
        .fetch_optional(db)
        .await?
        .ok_or("Owner role not found, run migrations first")?;

    let result = sqlx::query(
        "INSERT INTO users (email, password_hash, role_id, is_active, is_owner)
         VALUES ($1, $2, $3, true, true)
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(email)
    .bind(hashed_password)
    .bind(role_id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err("User with this email already exists".into());
    }

    Ok(())
}
