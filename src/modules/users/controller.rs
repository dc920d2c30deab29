use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use crate::access::Role;
use crate::middleware::access::{DecisionExt, require_level};
use crate::middleware::auth::CurrentUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::MessageResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    CreateUserDto, DeleteUserParams, PaginatedUsersResponse, UpdateUserDto, User, UserDetail,
    UserFilterParams,
};
use super::service::UsersService;

/// List users with filters and pagination
#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("search" = Option<String>, Query, description = "Match against email or employee name"),
        ("role_id" = Option<Uuid>, Query, description = "Filter by role"),
        ("is_active" = Option<bool>, Query, description = "Filter by active flag"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Users retrieved", body = PaginatedUsersResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filters): Query<UserFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    require_level(&user, Role::DirectManager)?;
    let response = UsersService::list(&state.db, &filters).await?;
    Ok(Json(response))
}

/// Get a user by id
///
/// Below Direct Manager the check runs against the target's employee profile;
/// users without one are visible only to senior roles and to themselves.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User retrieved", body = UserDetail),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip_all, fields(user_id = %user.id, target = %id))]
pub async fn get_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDetail>, AppError> {
    let detail = UsersService::get(&state.db, id).await?;

    if !user.role.at_least(Role::DirectManager) && user.id != id {
        match detail.employee_id {
            Some(employee_id) => {
                state
                    .access
                    .can_access_employee(&user.actor(), employee_id)
                    .await
                    .map_err(AppError::database)?
                    .into_result()?;
            }
            None => {
                return Err(AppError::forbidden("PERMISSION_DENIED", "Permission denied"));
            }
        }
    }

    Ok(Json(detail))
}

/// Create a user, optionally with an embedded employee record
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Email already exists", body = ErrorResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    require_level(&user, Role::DirectManager)?;
    let created = UsersService::create(&state.db, user.id, dto).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "No fields to update", body = ErrorResponse),
        (status = 403, description = "Owner account protected", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip_all, fields(user_id = %user.id, target = %id))]
pub async fn update_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    require_level(&user, Role::DirectManager)?;
    let updated = UsersService::update(&state.db, user.id, user.is_owner, id, dto).await?;
    Ok(Json(updated))
}

/// Soft delete a user; `?permanent=true` is owner-only
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User id"),
        ("permanent" = Option<bool>, Query, description = "Permanently delete (owner only)")
    ),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Owner account protected", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip_all, fields(user_id = %user.id, target = %id))]
pub async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteUserParams>,
) -> Result<Json<MessageResponse>, AppError> {
    require_level(&user, Role::DirectManager)?;
    let message = UsersService::delete(&state.db, user.id, user.is_owner, id, &params).await?;
    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}
