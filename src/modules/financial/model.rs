use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::utils::pagination::{PaginationMeta, PaginationParams};
use crate::utils::serde::deserialize_optional_uuid;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub paid_at: NaiveDate,
    pub recorded_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct OutstandingPayment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: Option<String>,
    pub amount: Decimal,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate totals across all clients.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct FinancialSummary {
    pub total_paid: Decimal,
    pub total_outstanding: Decimal,
    pub payments_count: i64,
    pub outstanding_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePaymentDto {
    pub client_id: Uuid,
    /// Must be positive, checked in the service.
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: Option<String>,
    pub paid_at: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub client_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutstandingFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub client_id: Option<Uuid>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedPaymentsResponse {
    pub data: Vec<Payment>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedOutstandingResponse {
    pub data: Vec<OutstandingPayment>,
    pub meta: PaginationMeta,
}
