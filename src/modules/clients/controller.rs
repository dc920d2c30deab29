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
    Client, ClientCategory, ClientDetail, ClientFilterParams, CreateClientCategoryDto,
    CreateClientDto, DeleteClientParams, PaginatedClientsResponse, UpdateClientDto,
};
use super::service::ClientsService;

/// List clients visible to the caller
#[utoipa::path(
    get,
    path = "/api/clients",
    params(
        ("search" = Option<String>, Query, description = "Match against name, company or email"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by category"),
        ("assigned_employee_id" = Option<Uuid>, Query, description = "Filter by assignee"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Clients retrieved", body = PaginatedClientsResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_clients(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filters): Query<ClientFilterParams>,
) -> Result<Json<PaginatedClientsResponse>, AppError> {
    let response = ClientsService::list(&state.db, &user, &filters).await?;
    Ok(Json(response))
}

/// Get a client with payment totals
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client retrieved", body = ClientDetail),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
#[instrument(skip_all, fields(user_id = %user.id, client_id = %id))]
pub async fn get_client(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientDetail>, AppError> {
    state
        .access
        .can_access_client(&user.actor(), id)
        .await
        .map_err(AppError::database)?
        .into_result()?;

    let client = ClientsService::get(&state.db, id).await?;
    Ok(Json(client))
}

/// Create a client
#[utoipa::path(
    post,
    path = "/api/clients",
    request_body = CreateClientDto,
    responses(
        (status = 201, description = "Client created", body = Client),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 409, description = "Contract number already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_client(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(dto): ValidatedJson<CreateClientDto>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    require_level(&user, Role::TeamLeader)?;
    let client = ClientsService::create(&state.db, user.id, dto).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// Update a client
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = UpdateClientDto,
    responses(
        (status = 200, description = "Client updated", body = Client),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
#[instrument(skip_all, fields(user_id = %user.id, client_id = %id))]
pub async fn update_client(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateClientDto>,
) -> Result<Json<Client>, AppError> {
    state
        .access
        .can_access_client(&user.actor(), id)
        .await
        .map_err(AppError::database)?
        .into_result()?;

    let client = ClientsService::update(&state.db, user.id, id, dto).await?;
    Ok(Json(client))
}

/// Delete a client
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    params(
        ("id" = Uuid, Path, description = "Client id"),
        ("permanent" = Option<bool>, Query, description = "Hard delete, owner only")
    ),
    responses(
        (status = 200, description = "Client deleted", body = MessageResponse),
        (status = 400, description = "Outstanding payments exist", body = ErrorResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
#[instrument(skip_all, fields(user_id = %user.id, client_id = %id))]
pub async fn delete_client(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteClientParams>,
) -> Result<Json<MessageResponse>, AppError> {
    require_level(&user, Role::DirectManager)?;
    let message = ClientsService::delete(&state.db, user.id, user.is_owner, id, &params).await?;
    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

/// List client categories
#[utoipa::path(
    get,
    path = "/api/clients/categories/all",
    responses(
        (status = 200, description = "Categories retrieved", body = [ClientCategory])
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
#[instrument(skip_all, fields(user_id = %_user.id))]
pub async fn list_client_categories(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<ClientCategory>>, AppError> {
    let categories = ClientsService::categories(&state.db).await?;
    Ok(Json(categories))
}

/// Create a client category
#[utoipa::path(
    post,
    path = "/api/clients/categories",
    request_body = CreateClientCategoryDto,
    responses(
        (status = 201, description = "Category created", body = ClientCategory),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_client_category(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(dto): ValidatedJson<CreateClientCategoryDto>,
) -> Result<(StatusCode, Json<ClientCategory>), AppError> {
    require_level(&user, Role::DirectManager)?;
    let category = ClientsService::create_category(&state.db, user.id, dto).await?;
    Ok((StatusCode::CREATED, Json(category)))
}
