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
    CreateEmployeeDto, Employee, EmployeeFilterParams, PaginatedEmployeesResponse,
    UpdateEmployeeDto,
};
use super::service::EmployeesService;

/// List employees visible to the caller
#[utoipa::path(
    get,
    path = "/api/employees",
    params(
        ("search" = Option<String>, Query, description = "Match against name or employee number"),
        ("department_id" = Option<Uuid>, Query, description = "Filter by department"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Employees retrieved", body = PaginatedEmployeesResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_employees(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filters): Query<EmployeeFilterParams>,
) -> Result<Json<PaginatedEmployeesResponse>, AppError> {
    let response = EmployeesService::list(&state.db, &user, &filters).await?;
    Ok(Json(response))
}

/// Get an employee by id
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee retrieved", body = Employee),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
#[instrument(skip_all, fields(user_id = %user.id, employee_id = %id))]
pub async fn get_employee(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Employee>, AppError> {
    state
        .access
        .can_access_employee(&user.actor(), id)
        .await
        .map_err(AppError::database)?
        .into_result()?;

    let employee = EmployeesService::get(&state.db, id).await?;
    Ok(Json(employee))
}

/// Create an employee record for an existing user
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployeeDto,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "User already has an employee record", body = ErrorResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_employee(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(dto): ValidatedJson<CreateEmployeeDto>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    require_level(&user, Role::DirectManager)?;
    let employee = EmployeesService::create(&state.db, user.id, dto).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// Update an employee record
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    request_body = UpdateEmployeeDto,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
#[instrument(skip_all, fields(user_id = %user.id, employee_id = %id))]
pub async fn update_employee(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateEmployeeDto>,
) -> Result<Json<Employee>, AppError> {
    require_level(&user, Role::DirectManager)?;
    let employee = EmployeesService::update(&state.db, user.id, id, dto).await?;
    Ok(Json(employee))
}

/// Soft delete an employee record
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee deleted", body = MessageResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
#[instrument(skip_all, fields(user_id = %user.id, employee_id = %id))]
pub async fn delete_employee(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    require_level(&user, Role::DirectManager)?;
    EmployeesService::delete(&state.db, user.id, id).await?;
    Ok(Json(MessageResponse {
        message: "Employee deleted successfully".to_string(),
    }))
}
