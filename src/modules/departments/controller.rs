use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use crate::access::Role;
use crate::middleware::access::require_level;
use crate::middleware::auth::CurrentUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::MessageResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    CreateDepartmentDto, CreateSpecializationDto, Department, DepartmentListItem, Specialization,
    UpdateDepartmentDto,
};
use super::service::DepartmentsService;

/// List departments with member counts
#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "Departments retrieved", body = [DepartmentListItem])
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
#[instrument(skip_all, fields(user_id = %_user.id))]
pub async fn list_departments(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<DepartmentListItem>>, AppError> {
    let departments = DepartmentsService::list(&state.db).await?;
    Ok(Json(departments))
}

/// Get a department
#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    params(("id" = Uuid, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department retrieved", body = Department),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
#[instrument(skip_all, fields(user_id = %_user.id, department_id = %id))]
pub async fn get_department(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Department>, AppError> {
    let department = DepartmentsService::get(&state.db, id).await?;
    Ok(Json(department))
}

/// List a department's specializations
#[utoipa::path(
    get,
    path = "/api/departments/{id}/specializations",
    params(("id" = Uuid, Path, description = "Department id")),
    responses(
        (status = 200, description = "Specializations retrieved", body = [Specialization]),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
#[instrument(skip_all, fields(user_id = %_user.id, department_id = %id))]
pub async fn list_specializations(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Specialization>>, AppError> {
    let specializations = DepartmentsService::specializations(&state.db, id).await?;
    Ok(Json(specializations))
}

/// Create a department
#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartmentDto,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 409, description = "Department name taken", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_department(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(dto): ValidatedJson<CreateDepartmentDto>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    require_level(&user, Role::DirectManager)?;
    let department = DepartmentsService::create(&state.db, user.id, dto).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

/// Update a department
#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    params(("id" = Uuid, Path, description = "Department id")),
    request_body = UpdateDepartmentDto,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
#[instrument(skip_all, fields(user_id = %user.id, department_id = %id))]
pub async fn update_department(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateDepartmentDto>,
) -> Result<Json<Department>, AppError> {
    require_level(&user, Role::DirectManager)?;
    let department = DepartmentsService::update(&state.db, user.id, id, dto).await?;
    Ok(Json(department))
}

/// Delete an empty department
#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    params(("id" = Uuid, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department deleted", body = MessageResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 404, description = "Department not found", body = ErrorResponse),
        (status = 409, description = "Department still has employees", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
#[instrument(skip_all, fields(user_id = %user.id, department_id = %id))]
pub async fn delete_department(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    require_level(&user, Role::DirectManager)?;
    DepartmentsService::delete(&state.db, user.id, id).await?;
    Ok(Json(MessageResponse {
        message: "Department deleted successfully".to_string(),
    }))
}

/// Create a specialization under a department
#[utoipa::path(
    post,
    path = "/api/departments/{id}/specializations",
    params(("id" = Uuid, Path, description = "Department id")),
    request_body = CreateSpecializationDto,
    responses(
        (status = 201, description = "Specialization created", body = Specialization),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
#[instrument(skip_all, fields(user_id = %user.id, department_id = %id))]
pub async fn create_specialization(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateSpecializationDto>,
) -> Result<(StatusCode, Json<Specialization>), AppError> {
    require_level(&user, Role::DirectManager)?;
    let specialization =
        DepartmentsService::create_specialization(&state.db, user.id, id, dto).await?;
    Ok((StatusCode::CREATED, Json(specialization)))
}
