use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::utils::pagination::{PaginationMeta, PaginationParams};
use crate::utils::serde::deserialize_optional_bool;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub category: String,
    pub related_id: Option<Uuid>,
    pub related_type: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub unread_only: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedNotificationsResponse {
    pub data: Vec<Notification>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_params_tolerate_empty_strings() {
        let params: NotificationFilterParams =
            serde_json::from_str(r#"{"unread_only": "", "limit": "25"}"#).unwrap();
        assert!(params.unread_only.is_none());
        assert_eq!(params.pagination.limit(), 25);

        let params: NotificationFilterParams =
            serde_json::from_str(r#"{"unread_only": "true"}"#).unwrap();
        assert_eq!(params.unread_only, Some(true));
    }
}
