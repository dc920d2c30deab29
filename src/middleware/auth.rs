use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::access::{Actor, Role};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::verify_token;

/// Extractor for the authenticated user.
///
/// Verifies the bearer token, then loads the user and its role fresh from the
/// database. Claims only establish identity: role, owner flag and active
/// status always reflect the current row, so deactivating a user or changing
/// their role takes effect on their next request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role_id: Uuid,
    pub role: Role,
    pub is_owner: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct AuthRow {
    id: Uuid,
    email: String,
    role_id: Uuid,
    role_level: i16,
    is_active: bool,
    is_owner: bool,
}

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            role_id: self.role_id,
            role: self.role,
            is_owner: self.is_owner,
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("NO_TOKEN", "Access token required"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("NO_TOKEN", "Access token required"))?;

        let claims = verify_token(token, &state.jwt_config)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("INVALID_TOKEN", "Invalid token"))?;

        let row = sqlx::query_as::<_, AuthRow>(
            r#"
            SELECT u.id, u.email, u.role_id, r.level AS role_level, u.is_active, u.is_owner
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.id = $1 AND u.deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::unauthorized("INVALID_USER", "User no longer exists"))?;

        if !row.is_active {
            return Err(AppError::unauthorized(
                "ACCOUNT_DEACTIVATED",
                "Account has been deactivated",
            ));
        }

        let role = Role::from_level(row.role_level)
            .ok_or_else(|| AppError::internal(anyhow::anyhow!("unknown role level {}", row.role_level)))?;

        Ok(CurrentUser {
            id: row.id,
            email: row.email,
            role_id: row.role_id,
            role,
            is_owner: row.is_owner,
        })
    }
}
