use serde_json::json;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::utils::audit;
use crate::utils::errors::AppError;
use crate::utils::jwt::{create_access_token, create_refresh_token, verify_refresh_token};
use crate::utils::password::{hash_password, verify_password};

use super::model::{
    AuthenticatedUser, ChangePasswordRequest, EmployeeSummary, LoginRequest, LoginResponse,
    MeResponse, NamedRef, RefreshResponse, RoleSummary,
};

#[derive(Debug, sqlx::FromRow)]
struct LoginRow {
    id: Uuid,
    email: String,
    password_hash: String,
    is_active: bool,
    is_owner: bool,
    last_login: Option<chrono::DateTime<chrono::Utc>>,
    role_id: Uuid,
    role_name: String,
    role_level: i16,
    permissions: serde_json::Value,
}

#[derive(Debug, sqlx::FromRow)]
struct MeRow {
    id: Uuid,
    email: String,
    is_owner: bool,
    last_login: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
    role_id: Uuid,
    role_name: String,
    role_level: i16,
    permissions: serde_json::Value,
    employee_id: Option<Uuid>,
    employee_number: Option<String>,
    full_name: Option<String>,
    job_title: Option<String>,
    department_id: Option<Uuid>,
    department_name: Option<String>,
    specialization_id: Option<Uuid>,
    specialization_name: Option<String>,
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto, jwt_config))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let row = sqlx::query_as::<_, LoginRow>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.is_active, u.is_owner, u.last_login,
                   u.role_id, r.name AS role_name, r.level AS role_level, r.permissions
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.email = $1 AND u.deleted_at IS NULL
            "#,
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| {
            AppError::unauthorized("INVALID_CREDENTIALS", "Invalid email or password")
        })?;

        if !row.is_active {
            return Err(AppError::unauthorized(
                "ACCOUNT_DEACTIVATED",
                "Account is deactivated",
            ));
        }

        if !verify_password(&dto.password, &row.password_hash)? {
            tracing::warn!(email = %dto.email, "failed login attempt");
            return Err(AppError::unauthorized(
                "INVALID_CREDENTIALS",
                "Invalid email or password",
            ));
        }

        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(row.id)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        let access_token = create_access_token(row.id, &row.email, jwt_config)?;
        let refresh_token = create_refresh_token(row.id, jwt_config)?;

        audit::record(db, Some(row.id), "LOGIN", Some("USER"), Some(row.id), json!({})).await;
        tracing::info!(user_id = %row.id, "user logged in");

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user: AuthenticatedUser {
                id: row.id,
                email: row.email,
                role: RoleSummary {
                    id: row.role_id,
                    name: row.role_name,
                    level: row.role_level,
                    permissions: row.permissions,
                },
                is_owner: row.is_owner,
                last_login: row.last_login,
            },
        })
    }

    #[instrument(skip_all)]
    pub async fn refresh(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<RefreshResponse, AppError> {
        let claims = verify_refresh_token(refresh_token, jwt_config)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("INVALID_REFRESH_TOKEN", "Invalid refresh token"))?;

        let email = sqlx::query_scalar::<_, String>(
            "SELECT email FROM users WHERE id = $1 AND is_active = true AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| {
            AppError::unauthorized("INVALID_REFRESH_TOKEN", "Invalid refresh token")
        })?;

        let access_token = create_access_token(user_id, &email, jwt_config)?;
        Ok(RefreshResponse { access_token })
    }

    #[instrument(skip(db))]
    pub async fn me(db: &PgPool, user_id: Uuid) -> Result<MeResponse, AppError> {
        let row = sqlx::query_as::<_, MeRow>(
            r#"
            SELECT u.id, u.email, u.is_owner, u.last_login, u.created_at,
                   u.role_id, r.name AS role_name, r.level AS role_level, r.permissions,
                   e.id AS employee_id, e.employee_number, e.full_name, e.job_title,
                   d.id AS department_id, d.name AS department_name,
                   s.id AS specialization_id, s.name AS specialization_name
            FROM users u
            JOIN roles r ON r.id = u.role_id
            LEFT JOIN employees e ON e.user_id = u.id AND e.deleted_at IS NULL
            LEFT JOIN departments d ON d.id = e.department_id
            LEFT JOIN specializations s ON s.id = e.specialization_id
            WHERE u.id = $1 AND u.deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))?;

        let employee = match (row.employee_id, row.employee_number, row.full_name) {
            (Some(id), Some(employee_number), Some(full_name)) => Some(EmployeeSummary {
                id,
                employee_number,
                full_name,
                job_title: row.job_title,
                department: match (row.department_id, row.department_name) {
                    (Some(id), Some(name)) => Some(NamedRef { id, name }),
                    _ => None,
                },
                specialization: match (row.specialization_id, row.specialization_name) {
                    (Some(id), Some(name)) => Some(NamedRef { id, name }),
                    _ => None,
                },
            }),
            _ => None,
        };

        Ok(MeResponse {
            id: row.id,
            email: row.email,
            role: RoleSummary {
                id: row.role_id,
                name: row.role_name,
                level: row.role_level,
                permissions: row.permissions,
            },
            is_owner: row.is_owner,
            employee,
            last_login: row.last_login,
            created_at: row.created_at,
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        user_id: Uuid,
        dto: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let current_hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))?;

        if !verify_password(&dto.current_password, &current_hash)? {
            return Err(AppError::bad_request(
                "INVALID_CURRENT_PASSWORD",
                "Current password is incorrect",
            ));
        }

        let new_hash = hash_password(&dto.new_password)?;
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(&new_hash)
            .bind(user_id)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        audit::record(
            db,
            Some(user_id),
            "PASSWORD_CHANGE",
            Some("USER"),
            Some(user_id),
            json!({}),
        )
        .await;

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn logout(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        audit::record(db, Some(user_id), "LOGOUT", Some("USER"), Some(user_id), json!({})).await;
        tracing::info!(user_id = %user_id, "user logged out");
        Ok(())
    }
}
