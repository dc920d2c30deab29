use axum::Json;
use axum::extract::{Path, Query, State};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::CurrentUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

use super::model::{
    MarkAllReadResponse, Notification, NotificationFilterParams, PaginatedNotificationsResponse,
    UnreadCountResponse,
};
use super::service::NotificationsService;

/// List the caller's notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("unread_only" = Option<bool>, Query, description = "Only unread notifications"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Notifications retrieved", body = PaginatedNotificationsResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_notifications(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filters): Query<NotificationFilterParams>,
) -> Result<Json<PaginatedNotificationsResponse>, AppError> {
    let response = NotificationsService::list(&state.db, user.id, &filters).await?;
    Ok(Json(response))
}

/// Count the caller's unread notifications
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn unread_count(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let count = NotificationsService::unread_count(&state.db, user.id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// Mark one notification read
#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip_all, fields(user_id = %user.id, notification_id = %id))]
pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let notification = NotificationsService::mark_read(&state.db, user.id, id).await?;
    Ok(Json(notification))
}

/// Mark all of the caller's notifications read
#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "Notifications marked read", body = MarkAllReadResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let updated = NotificationsService::mark_all_read(&state.db, user.id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
