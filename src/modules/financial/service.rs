use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::utils::audit;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{
    CreatePaymentDto, FinancialSummary, OutstandingFilterParams, OutstandingPayment,
    PaginatedOutstandingResponse, PaginatedPaymentsResponse, Payment, PaymentFilterParams,
};

pub struct FinancialService;

impl FinancialService {
    #[instrument(skip(db, filters))]
    pub async fn list_payments(
        db: &PgPool,
        filters: &PaymentFilterParams,
    ) -> Result<PaginatedPaymentsResponse, AppError> {
        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM payments p ");
        let mut list_query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT p.id, p.client_id, c.full_name AS client_name, p.amount, p.currency,
                   p.paid_at, p.recorded_by, p.notes, p.created_at
            FROM payments p
            LEFT JOIN clients c ON c.id = p.client_id
            "#,
        );

        for query in [&mut count_query, &mut list_query] {
            query.push(" WHERE true ");
            if let Some(client_id) = filters.client_id {
                query.push(" AND p.client_id = ");
                query.push_bind(client_id);
            }
        }

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        list_query.push(" ORDER BY p.paid_at DESC, p.created_at DESC LIMIT ");
        list_query.push_bind(filters.pagination.limit());
        list_query.push(" OFFSET ");
        list_query.push_bind(filters.pagination.offset());

        let data = list_query
            .build_query_as::<Payment>()
            .fetch_all(db)
            .await
            .map_err(AppError::database)?;

        Ok(PaginatedPaymentsResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db, dto), fields(client_id = %dto.client_id))]
    pub async fn create_payment(
        db: &PgPool,
        actor_id: Uuid,
        dto: CreatePaymentDto,
    ) -> Result<Payment, AppError> {
        if dto.amount <= Decimal::ZERO {
            return Err(AppError::bad_request(
                "VALIDATION_ERROR",
                "Payment amount must be positive",
            ));
        }

        let client = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM clients WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(dto.client_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?;

        if client.is_none() {
            return Err(AppError::not_found("CLIENT_NOT_FOUND", "Client not found"));
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            WITH inserted AS (
                INSERT INTO payments (client_id, amount, currency, paid_at, recorded_by, notes)
                VALUES ($1, $2, COALESCE($3, 'USD'), COALESCE($4, CURRENT_DATE), $5, $6)
                RETURNING id, client_id, amount, currency, paid_at, recorded_by, notes, created_at
            )
            SELECT i.id, i.client_id, c.full_name AS client_name, i.amount, i.currency,
                   i.paid_at, i.recorded_by, i.notes, i.created_at
            FROM inserted i
            LEFT JOIN clients c ON c.id = i.client_id
            "#,
        )
        .bind(dto.client_id)
        .bind(dto.amount)
        .bind(&dto.currency)
        .bind(dto.paid_at)
        .bind(actor_id)
        .bind(&dto.notes)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        audit::record(
            db,
            Some(actor_id),
            "CREATE_PAYMENT",
            Some("PAYMENT"),
            Some(payment.id),
            json!({ "client_id": dto.client_id, "amount": dto.amount }),
        )
        .await;

        Ok(payment)
    }

    #[instrument(skip(db, filters))]
    pub async fn list_outstanding(
        db: &PgPool,
        filters: &OutstandingFilterParams,
    ) -> Result<PaginatedOutstandingResponse, AppError> {
        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM outstanding_payments op ");
        let mut list_query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT op.id, op.client_id, c.full_name AS client_name, op.amount,
                   op.due_date, op.status, op.created_at
            FROM outstanding_payments op
            LEFT JOIN clients c ON c.id = op.client_id
            "#,
        );

        for query in [&mut count_query, &mut list_query] {
            query.push(" WHERE op.status <> 'paid' ");
            if let Some(client_id) = filters.client_id {
                query.push(" AND op.client_id = ");
                query.push_bind(client_id);
            }
            if let Some(status) = filters.status.as_deref().filter(|s| !s.is_empty()) {
                query.push(" AND op.status = ");
                query.push_bind(status.to_string());
            }
        }

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        list_query.push(" ORDER BY op.due_date ASC NULLS LAST LIMIT ");
        list_query.push_bind(filters.pagination.limit());
        list_query.push(" OFFSET ");
        list_query.push_bind(filters.pagination.offset());

        let data = list_query
            .build_query_as::<OutstandingPayment>()
            .fetch_all(db)
            .await
            .map_err(AppError::database)?;

        Ok(PaginatedOutstandingResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn summary(db: &PgPool) -> Result<FinancialSummary, AppError> {
        sqlx::query_as::<_, FinancialSummary>(
            r#"
            SELECT COALESCE((SELECT SUM(amount) FROM payments), 0) AS total_paid,
                   COALESCE((SELECT SUM(amount) FROM outstanding_payments
                             WHERE status <> 'paid'), 0) AS total_outstanding,
                   (SELECT COUNT(*) FROM payments) AS payments_count,
                   (SELECT COUNT(*) FROM outstanding_payments
                    WHERE status <> 'paid') AS outstanding_count
            "#,
        )
        .fetch_one(db)
        .await
        .map_err(AppError::database)
    }
}
