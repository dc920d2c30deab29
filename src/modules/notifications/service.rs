use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{Notification, NotificationFilterParams, PaginatedNotificationsResponse};

pub struct NotificationsService;

impl NotificationsService {
    #[instrument(skip(db, filters))]
    pub async fn list(
        db: &PgPool,
        user_id: Uuid,
        filters: &NotificationFilterParams,
    ) -> Result<PaginatedNotificationsResponse, AppError> {
        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM notifications ");
        let mut list_query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT id, user_id, title, message, kind, category,
                   related_id, related_type, is_read, created_at
            FROM notifications
            "#,
        );

        for query in [&mut count_query, &mut list_query] {
            query.push(" WHERE user_id = ");
            query.push_bind(user_id);
            if filters.unread_only == Some(true) {
                query.push(" AND is_read = false ");
            }
        }

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        list_query.push(" ORDER BY created_at DESC LIMIT ");
        list_query.push_bind(filters.pagination.limit());
        list_query.push(" OFFSET ");
        list_query.push_bind(filters.pagination.offset());

        let data = list_query
            .build_query_as::<Notification>()
            .fetch_all(db)
            .await
            .map_err(AppError::database)?;

        Ok(PaginatedNotificationsResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn unread_count(db: &PgPool, user_id: Uuid) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)
    }

    /// Marks one of the caller's notifications read. Rows belonging to other
    /// users are indistinguishable from absent ones.
    #[instrument(skip(db))]
    pub async fn mark_read(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET is_read = true
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, message, kind, category,
                      related_id, related_type, is_read, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found("NOTIFICATION_NOT_FOUND", "Notification not found"))
    }

    #[instrument(skip(db))]
    pub async fn mark_all_read(db: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(db)
        .await
        .map_err(AppError::database)?;

        Ok(result.rows_affected())
    }

    /// Best-effort delivery used by the task flows. A failed insert is logged
    /// and never fails the request that triggered it.
    pub async fn notify(
        db: &PgPool,
        user_id: Uuid,
        title: &str,
        message: &str,
        category: &str,
        related_id: Option<Uuid>,
        related_type: Option<&str>,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications
                (user_id, title, message, kind, category, related_id, related_type)
            VALUES ($1, $2, $3, 'info', $4, $5, $6)
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(message)
        .bind(category)
        .bind(related_id)
        .bind(related_type)
        .execute(db)
        .await;

        if let Err(error) = result {
            warn!(%user_id, %error, "failed to deliver notification");
        }
    }
}
