use chrono::Utc;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::utils::audit;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;
use crate::utils::password::hash_password;

use super::model::{
    CreateUserDto, DeleteUserParams, PaginatedUsersResponse, UpdateUserDto, User, UserDetail,
    UserFilterParams, UserListItem,
};

#[derive(Debug, sqlx::FromRow)]
struct OwnerFlagRow {
    is_owner: bool,
}

pub struct UsersService;

impl UsersService {
    #[instrument(skip(db, filters))]
    pub async fn list(
        db: &PgPool,
        filters: &UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let mut count_query: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM users u LEFT JOIN employees e ON e.user_id = u.id ",
        );
        let mut list_query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT u.id, u.email, u.role_id, r.name AS role_name, r.level AS role_level,
                   u.is_active, u.is_owner, u.last_login, u.created_at,
                   e.employee_number, e.full_name, e.job_title, d.name AS department_name
            FROM users u
            JOIN roles r ON r.id = u.role_id
            LEFT JOIN employees e ON e.user_id = u.id AND e.deleted_at IS NULL
            LEFT JOIN departments d ON d.id = e.department_id
            "#,
        );

        for query in [&mut count_query, &mut list_query] {
            query.push(" WHERE u.deleted_at IS NULL ");
            if let Some(search) = filters.search.as_deref().filter(|s| !s.is_empty()) {
                let pattern = format!("%{search}%");
                query.push(" AND (u.email ILIKE ");
                query.push_bind(pattern.clone());
                query.push(" OR e.full_name ILIKE ");
                query.push_bind(pattern);
                query.push(") ");
            }
            if let Some(role_id) = filters.role_id {
                query.push(" AND u.role_id = ");
                query.push_bind(role_id);
            }
            if let Some(is_active) = filters.is_active {
                query.push(" AND u.is_active = ");
                query.push_bind(is_active);
            }
        }

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        list_query.push(" ORDER BY u.created_at DESC LIMIT ");
        list_query.push_bind(filters.pagination.limit());
        list_query.push(" OFFSET ");
        list_query.push_bind(filters.pagination.offset());

        let data = list_query
            .build_query_as::<UserListItem>()
            .fetch_all(db)
            .await
            .map_err(AppError::database)?;

        Ok(PaginatedUsersResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, id: Uuid) -> Result<UserDetail, AppError> {
        sqlx::query_as::<_, UserDetail>(
            r#"
            SELECT u.id, u.email, u.role_id, r.name AS role_name, r.level AS role_level,
                   u.is_active, u.is_owner, u.last_login, u.created_at,
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
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))
    }

    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn create(db: &PgPool, actor_id: Uuid, dto: CreateUserDto) -> Result<User, AppError> {
        let exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?;

        if exists.is_some() {
            return Err(AppError::bad_request(
                "EMAIL_EXISTS",
                "User with this email already exists",
            ));
        }

        let password_hash = hash_password(&dto.password)?;

        let mut tx = db.begin().await.map_err(AppError::database)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role_id, is_active)
            VALUES ($1, $2, $3, true)
            RETURNING id, email, role_id, is_active, is_owner, last_login, created_at
            "#,
        )
        .bind(&dto.email)
        .bind(&password_hash)
        .bind(dto.role_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::database)?;

        if let Some(employee) = &dto.employee {
            let employee_number = format!("EMP{}", Utc::now().timestamp_millis());
            sqlx::query(
                r#"
                INSERT INTO employees
                    (user_id, employee_number, full_name, job_title, department_id,
                     specialization_id, hire_date, employment_status)
                VALUES ($1, $2, $3, $4, $5, $6, CURRENT_DATE, 'active')
                "#,
            )
            .bind(user.id)
            .bind(&employee_number)
            .bind(&employee.full_name)
            .bind(&employee.job_title)
            .bind(employee.department_id)
            .bind(employee.specialization_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::database)?;
        }

        tx.commit().await.map_err(AppError::database)?;

        audit::record(
            db,
            Some(actor_id),
            "CREATE_USER",
            Some("USER"),
            Some(user.id),
            json!({ "email": dto.email, "role_id": dto.role_id }),
        )
        .await;

        Ok(user)
    }

    #[instrument(skip(db, dto))]
    pub async fn update(
        db: &PgPool,
        actor_id: Uuid,
        actor_is_owner: bool,
        id: Uuid,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let target = sqlx::query_as::<_, OwnerFlagRow>(
            "SELECT is_owner FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))?;

        if target.is_owner && !actor_is_owner {
            return Err(AppError::forbidden(
                "OWNER_UPDATE_DENIED",
                "Cannot update owner account",
            ));
        }

        if dto.email.is_none()
            && dto.password.is_none()
            && dto.role_id.is_none()
            && dto.is_active.is_none()
        {
            return Err(AppError::bad_request("NO_UPDATE_FIELDS", "No fields to update"));
        }

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut fields = query.separated(", ");
        if let Some(email) = &dto.email {
            fields.push("email = ").push_bind_unseparated(email.clone());
        }
        if let Some(password) = &dto.password {
            let hash = hash_password(password)?;
            fields.push("password_hash = ").push_bind_unseparated(hash);
        }
        if let Some(role_id) = dto.role_id {
            fields.push("role_id = ").push_bind_unseparated(role_id);
        }
        if let Some(is_active) = dto.is_active {
            fields.push("is_active = ").push_bind_unseparated(is_active);
        }
        fields.push("updated_at = now()");
        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" RETURNING id, email, role_id, is_active, is_owner, last_login, created_at");

        let user = query
            .build_query_as::<User>()
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        audit::record(db, Some(actor_id), "UPDATE_USER", Some("USER"), Some(id), json!({})).await;

        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn delete(
        db: &PgPool,
        actor_id: Uuid,
        actor_is_owner: bool,
        id: Uuid,
        params: &DeleteUserParams,
    ) -> Result<&'static str, AppError> {
        let target = sqlx::query_as::<_, OwnerFlagRow>(
            "SELECT is_owner FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))?;

        if target.is_owner {
            return Err(AppError::forbidden(
                "OWNER_DELETE_DENIED",
                "Cannot delete owner account",
            ));
        }

        let permanent = params.permanent.unwrap_or(false);
        if permanent && !actor_is_owner {
            return Err(AppError::forbidden(
                "PERMANENT_DELETE_DENIED",
                "Only owner can permanently delete users",
            ));
        }

        if permanent {
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(db)
                .await
                .map_err(AppError::database)?;
        } else {
            sqlx::query("UPDATE users SET deleted_at = now() WHERE id = $1")
                .bind(id)
                .execute(db)
                .await
                .map_err(AppError::database)?;
        }

        audit::record(
            db,
            Some(actor_id),
            "DELETE_USER",
            Some("USER"),
            Some(id),
            json!({ "permanent": permanent }),
        )
        .await;

        Ok(if permanent {
            "User permanently deleted"
        } else {
            "User deactivated successfully"
        })
    }
}
