use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::middleware::auth::CurrentUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    CreatePaymentDto, FinancialSummary, OutstandingFilterParams, PaginatedOutstandingResponse,
    PaginatedPaymentsResponse, Payment, PaymentFilterParams,
};
use super::service::FinancialService;

/// List recorded payments
#[utoipa::path(
    get,
    path = "/api/financial/payments",
    params(
        ("client_id" = Option<Uuid>, Query, description = "Filter by client"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Payments retrieved", body = PaginatedPaymentsResponse),
        (status = 403, description = "Financial access denied", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Financial"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_payments(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filters): Query<PaymentFilterParams>,
) -> Result<Json<PaginatedPaymentsResponse>, AppError> {
    let response = FinancialService::list_payments(&state.db, &filters).await?;
    Ok(Json(response))
}

/// Record a payment
#[utoipa::path(
    post,
    path = "/api/financial/payments",
    request_body = CreatePaymentDto,
    responses(
        (status = 201, description = "Payment recorded", body = Payment),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 403, description = "Financial access denied", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Financial"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(dto): ValidatedJson<CreatePaymentDto>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let payment = FinancialService::create_payment(&state.db, user.id, dto).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// List unpaid outstanding payments
#[utoipa::path(
    get,
    path = "/api/financial/outstanding",
    params(
        ("client_id" = Option<Uuid>, Query, description = "Filter by client"),
        ("status" = Option<String>, Query, description = "Filter by severity status"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Outstanding payments retrieved", body = PaginatedOutstandingResponse),
        (status = 403, description = "Financial access denied", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Financial"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_outstanding(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filters): Query<OutstandingFilterParams>,
) -> Result<Json<PaginatedOutstandingResponse>, AppError> {
    let response = FinancialService::list_outstanding(&state.db, &filters).await?;
    Ok(Json(response))
}

/// Financial totals across all clients
#[utoipa::path(
    get,
    path = "/api/financial/summary",
    responses(
        (status = 200, description = "Summary retrieved", body = FinancialSummary),
        (status = 403, description = "Financial access denied", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Financial"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn financial_summary(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<FinancialSummary>, AppError> {
    let summary = FinancialService::summary(&state.db).await?;
    Ok(Json(summary))
}
