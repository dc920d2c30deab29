use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::utils::pagination::{PaginationMeta, PaginationParams};
use crate::utils::serde::{deserialize_optional_bool, deserialize_optional_uuid};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub priority: String,
    pub status: String,
    pub progress_percentage: i16,
    pub expected_duration: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub client_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Task row for listings, with joined names, comment count and overdue flag.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TaskListItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub priority: String,
    pub status: String,
    pub progress_percentage: i16,
    pub due_date: Option<NaiveDate>,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assigned_employee_name: Option<String>,
    pub created_by: Uuid,
    pub created_by_email: Option<String>,
    pub comments_count: i64,
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub priority: String,
    pub status: String,
    pub progress_percentage: i16,
    pub expected_duration: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assigned_employee_name: Option<String>,
    pub created_by: Uuid,
    pub created_by_email: Option<String>,
    pub is_overdue: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TaskComment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub comment: String,
    pub commented_by: Uuid,
    pub commented_by_email: Option<String>,
    pub commented_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TaskHistoryEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub action_type: String,
    pub action_description: Option<String>,
    pub performed_by: Option<Uuid>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Full task view with its comment thread and change history.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: TaskView,
    pub comments: Vec<TaskComment>,
    pub history: Vec<TaskHistoryEntry>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TaskCategory {
    pub id: Uuid,
    pub specialization_id: Option<Uuid>,
    pub name: String,
    pub specialization_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_priority() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTaskDto {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[serde(default = "default_priority")]
    pub priority: String,
    pub expected_duration: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub client_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskDto {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub priority: Option<String>,
    pub expected_duration: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub client_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskStatusDto {
    #[validate(length(min = 1))]
    pub status: String,
    #[validate(range(min = 0, max = 100))]
    pub progress_percentage: Option<i16>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTaskCommentDto {
    #[validate(length(min = 1))]
    pub comment: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskFilterParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub category_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub assigned_to: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub client_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub created_by: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub overdue_only: Option<bool>,
    /// `field:asc` or `field:desc`, whitelisted in the service.
    pub sort: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Default, Deserialize)]
pub struct MyTasksParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub overdue_only: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedTasksResponse {
    pub data: Vec<TaskListItem>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn create_dto_defaults_priority() {
        let dto: CreateTaskDto = serde_json::from_str(r#"{"title": "Quarterly review"}"#).unwrap();
        assert_eq!(dto.priority, "medium");
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn create_dto_requires_title() {
        let dto: CreateTaskDto = serde_json::from_str(r#"{"title": ""}"#).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn status_dto_bounds_progress() {
        let dto = UpdateTaskStatusDto {
            status: "in_progress".into(),
            progress_percentage: Some(101),
            notes: None,
        };
        assert!(dto.validate().is_err());

        let dto = UpdateTaskStatusDto {
            status: "in_progress".into(),
            progress_percentage: Some(40),
            notes: None,
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn filter_params_tolerate_empty_strings() {
        let params: TaskFilterParams =
            serde_json::from_str(r#"{"assigned_to": "", "overdue_only": "true", "page": "3"}"#)
                .unwrap();
        assert!(params.assigned_to.is_none());
        assert_eq!(params.overdue_only, Some(true));
        assert_eq!(params.pagination.page(), 3);
    }
}
