use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::access::DecisionExt;
use crate::middleware::auth::CurrentUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    CreateTaskCommentDto, CreateTaskDto, MyTasksParams, PaginatedTasksResponse, Task,
    TaskCategory, TaskComment, TaskDetail, TaskFilterParams, TaskListItem, UpdateTaskDto,
    UpdateTaskStatusDto,
};
use super::service::TasksService;

/// List tasks visible to the caller
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("priority" = Option<String>, Query, description = "Filter by priority"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by category"),
        ("assigned_to" = Option<Uuid>, Query, description = "Filter by assignee"),
        ("client_id" = Option<Uuid>, Query, description = "Filter by client"),
        ("created_by" = Option<Uuid>, Query, description = "Filter by creator"),
        ("overdue_only" = Option<bool>, Query, description = "Only overdue tasks"),
        ("sort" = Option<String>, Query, description = "field:asc|desc"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Tasks retrieved", body = PaginatedTasksResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filters): Query<TaskFilterParams>,
) -> Result<Json<PaginatedTasksResponse>, AppError> {
    let response = TasksService::list(&state.db, &user, &filters).await?;
    Ok(Json(response))
}

/// Get a task with its comments and history
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task retrieved", body = TaskDetail),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
#[instrument(skip_all, fields(user_id = %user.id, task_id = %id))]
pub async fn get_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskDetail>, AppError> {
    state
        .access
        .can_access_task(&user.actor(), id)
        .await
        .map_err(AppError::database)?
        .into_result()?;

    let task = TasksService::get(&state.db, id).await?;
    Ok(Json(task))
}

/// Create a task
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskDto,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Invalid priority", body = ErrorResponse),
        (status = 403, description = "Assignment not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_task(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(dto): ValidatedJson<CreateTaskDto>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = TasksService::create(&state.db, &user, dto).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Update a task
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = UpdateTaskDto,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
#[instrument(skip_all, fields(user_id = %user.id, task_id = %id))]
pub async fn update_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateTaskDto>,
) -> Result<Json<Task>, AppError> {
    state
        .access
        .can_access_task(&user.actor(), id)
        .await
        .map_err(AppError::database)?
        .into_result()?;

    let task = TasksService::update(&state.db, user.id, id, dto).await?;
    Ok(Json(task))
}

/// Update a task's status
#[utoipa::path(
    put,
    path = "/api/tasks/{id}/status",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = UpdateTaskStatusDto,
    responses(
        (status = 200, description = "Status updated", body = Task),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
#[instrument(skip_all, fields(user_id = %user.id, task_id = %id))]
pub async fn update_task_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateTaskStatusDto>,
) -> Result<Json<Task>, AppError> {
    state
        .access
        .can_access_task(&user.actor(), id)
        .await
        .map_err(AppError::database)?
        .into_result()?;

    let task = TasksService::update_status(&state.db, &user, id, dto).await?;
    Ok(Json(task))
}

/// Comment on a task
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/comments",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = CreateTaskCommentDto,
    responses(
        (status = 201, description = "Comment added", body = TaskComment),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
#[instrument(skip_all, fields(user_id = %user.id, task_id = %id))]
pub async fn comment_on_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateTaskCommentDto>,
) -> Result<(StatusCode, Json<TaskComment>), AppError> {
    state
        .access
        .can_access_task(&user.actor(), id)
        .await
        .map_err(AppError::database)?
        .into_result()?;

    let comment = TasksService::comment(&state.db, user.id, id, dto).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// List tasks assigned to the caller
#[utoipa::path(
    get,
    path = "/api/tasks/my-tasks",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("priority" = Option<String>, Query, description = "Filter by priority"),
        ("overdue_only" = Option<bool>, Query, description = "Only overdue tasks")
    ),
    responses(
        (status = 200, description = "Tasks retrieved", body = [TaskListItem]),
        (status = 404, description = "No employee profile", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn my_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<MyTasksParams>,
) -> Result<Json<Vec<TaskListItem>>, AppError> {
    let tasks = TasksService::my_tasks(&state.db, user.id, &params).await?;
    Ok(Json(tasks))
}

/// List active task categories
#[utoipa::path(
    get,
    path = "/api/tasks/categories/all",
    responses(
        (status = 200, description = "Categories retrieved", body = [TaskCategory])
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
#[instrument(skip_all, fields(user_id = %_user.id))]
pub async fn list_task_categories(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<TaskCategory>>, AppError> {
    let categories = TasksService::categories(&state.db).await?;
    Ok(Json(categories))
}
