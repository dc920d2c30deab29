use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::access::Role;
use crate::middleware::auth::CurrentUser;
use crate::modules::notifications::service::NotificationsService;
use crate::utils::audit;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{
    CreateTaskCommentDto, CreateTaskDto, MyTasksParams, PaginatedTasksResponse, Task, TaskCategory,
    TaskComment, TaskDetail, TaskFilterParams, TaskHistoryEntry, TaskListItem, TaskView,
    UpdateTaskDto, UpdateTaskStatusDto,
};

const VALID_PRIORITIES: [&str; 4] = ["urgent", "high", "medium", "low"];

const VALID_STATUSES: [&str; 7] = [
    "new",
    "in_progress",
    "on_hold",
    "under_review",
    "completed",
    "delayed",
    "cancelled",
];

const SELECT_TASK_LIST: &str = r#"
    SELECT t.id, t.title, t.description, t.category_id, tc.name AS category_name,
           t.priority, t.status, t.progress_percentage, t.due_date,
           t.client_id, c.full_name AS client_name,
           t.assigned_to, e.full_name AS assigned_employee_name,
           t.created_by, u.email AS created_by_email,
           (SELECT COUNT(*) FROM task_comments tcm WHERE tcm.task_id = t.id) AS comments_count,
           (t.status <> 'completed' AND t.due_date IS NOT NULL AND t.due_date < CURRENT_DATE)
               AS is_overdue,
           t.created_at
    FROM tasks t
    LEFT JOIN task_categories tc ON tc.id = t.category_id
    LEFT JOIN clients c ON c.id = t.client_id
    LEFT JOIN employees e ON e.id = t.assigned_to
    LEFT JOIN users u ON u.id = t.created_by
"#;

const RETURNING_TASK: &str = r#"
    RETURNING id, title, description, category_id, priority, status,
              progress_percentage, expected_duration, start_date, due_date,
              client_id, assigned_to, created_by, completed_at, created_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct TaskStateRow {
    status: String,
    assigned_to: Option<Uuid>,
}

/// Maps a `field:direction` sort parameter onto a whitelisted ORDER BY
/// fragment. Anything unrecognized falls back to newest-first.
fn parse_sort(sort: Option<&str>) -> (&'static str, &'static str) {
    let (field, direction) = sort
        .and_then(|s| s.split_once(':'))
        .unwrap_or(("created_at", "desc"));
    let column = match field {
        "created_at" => "t.created_at",
        "updated_at" => "t.updated_at",
        "due_date" => "t.due_date",
        "priority" => "t.priority",
        "status" => "t.status",
        "title" => "t.title",
        _ => "t.created_at",
    };
    let order = if direction == "asc" { "ASC" } else { "DESC" };
    (column, order)
}

pub struct TasksService;

impl TasksService {
    /// Filtered listing. Level-4 actors are restricted to tasks assigned to
    /// them or created by them; everyone else sees all tasks.
    #[instrument(skip(db, user, filters), fields(user_id = %user.id))]
    pub async fn list(
        db: &PgPool,
        user: &CurrentUser,
        filters: &TaskFilterParams,
    ) -> Result<PaginatedTasksResponse, AppError> {
        let own_employee_id = if user.role == Role::Employee {
            sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM employees WHERE user_id = $1 AND deleted_at IS NULL",
            )
            .bind(user.id)
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
        } else {
            None
        };

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM tasks t ");
        let mut list_query: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_TASK_LIST);

        for query in [&mut count_query, &mut list_query] {
            query.push(" WHERE t.deleted_at IS NULL ");
            if user.role == Role::Employee {
                match own_employee_id {
                    Some(employee_id) => {
                        query.push(" AND (t.assigned_to = ");
                        query.push_bind(employee_id);
                        query.push(" OR t.created_by = ");
                        query.push_bind(user.id);
                        query.push(") ");
                    }
                    None => {
                        query.push(" AND t.created_by = ");
                        query.push_bind(user.id);
                    }
                }
            }
            if let Some(status) = filters.status.as_deref().filter(|s| !s.is_empty()) {
                query.push(" AND t.status = ");
                query.push_bind(status.to_string());
            }
            if let Some(priority) = filters.priority.as_deref().filter(|s| !s.is_empty()) {
                query.push(" AND t.priority = ");
                query.push_bind(priority.to_string());
            }
            if let Some(category_id) = filters.category_id {
                query.push(" AND t.category_id = ");
                query.push_bind(category_id);
            }
            if let Some(assigned_to) = filters.assigned_to {
                query.push(" AND t.assigned_to = ");
                query.push_bind(assigned_to);
            }
            if let Some(client_id) = filters.client_id {
                query.push(" AND t.client_id = ");
                query.push_bind(client_id);
            }
            if let Some(created_by) = filters.created_by {
                query.push(" AND t.created_by = ");
                query.push_bind(created_by);
            }
            if filters.overdue_only == Some(true) {
                query.push(" AND t.status <> 'completed' AND t.due_date < CURRENT_DATE ");
            }
        }

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        let (column, order) = parse_sort(filters.sort.as_deref());
        list_query.push(format!(" ORDER BY {column} {order} LIMIT "));
        list_query.push_bind(filters.pagination.limit());
        list_query.push(" OFFSET ");
        list_query.push_bind(filters.pagination.offset());

        let data = list_query
            .build_query_as::<TaskListItem>()
            .fetch_all(db)
            .await
            .map_err(AppError::database)?;

        Ok(PaginatedTasksResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, id: Uuid) -> Result<TaskDetail, AppError> {
        let task = sqlx::query_as::<_, TaskView>(
            r#"
            SELECT t.id, t.title, t.description, t.category_id, tc.name AS category_name,
                   t.priority, t.status, t.progress_percentage, t.expected_duration,
                   t.start_date, t.due_date,
                   t.client_id, c.full_name AS client_name,
                   t.assigned_to, e.full_name AS assigned_employee_name,
                   t.created_by, u.email AS created_by_email,
                   (t.status <> 'completed' AND t.due_date IS NOT NULL
                    AND t.due_date < CURRENT_DATE) AS is_overdue,
                   t.completed_at, t.created_at
            FROM tasks t
            LEFT JOIN task_categories tc ON tc.id = t.category_id
            LEFT JOIN clients c ON c.id = t.client_id
            LEFT JOIN employees e ON e.id = t.assigned_to
            LEFT JOIN users u ON u.id = t.created_by
            WHERE t.id = $1 AND t.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found("TASK_NOT_FOUND", "Task not found"))?;

        let comments = sqlx::query_as::<_, TaskComment>(
            r#"
            SELECT tc.id, tc.task_id, tc.comment, tc.commented_by,
                   u.email AS commented_by_email, e.full_name AS commented_by_name,
                   tc.created_at
            FROM task_comments tc
            LEFT JOIN users u ON u.id = tc.commented_by
            LEFT JOIN employees e ON e.user_id = u.id
            WHERE tc.task_id = $1
            ORDER BY tc.created_at ASC
            "#,
        )
        .bind(id)
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        let history = sqlx::query_as::<_, TaskHistoryEntry>(
            r#"
            SELECT id, task_id, action_type, action_description, performed_by,
                   old_values, new_values, created_at
            FROM task_history
            WHERE task_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(id)
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        Ok(TaskDetail {
            task,
            comments,
            history,
        })
    }

    #[instrument(skip(db, user, dto), fields(user_id = %user.id, title = %dto.title))]
    pub async fn create(
        db: &PgPool,
        user: &CurrentUser,
        dto: CreateTaskDto,
    ) -> Result<Task, AppError> {
        if !VALID_PRIORITIES.contains(&dto.priority.as_str()) {
            return Err(AppError::bad_request("VALIDATION_ERROR", "Invalid priority"));
        }

        if let Some(assigned_to) = dto.assigned_to {
            let assignee_level = sqlx::query_scalar::<_, i16>(
                r#"
                SELECT r.level FROM employees e
                JOIN users u ON u.id = e.user_id
                JOIN roles r ON r.id = u.role_id
                WHERE e.id = $1 AND e.deleted_at IS NULL
                "#,
            )
            .bind(assigned_to)
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found("EMPLOYEE_NOT_FOUND", "Employee not found"))?;

            if user.role == Role::Employee && assignee_level <= Role::TeamLeader.level() {
                return Err(AppError::forbidden(
                    "ASSIGNMENT_NOT_ALLOWED",
                    "Cannot assign tasks to managers",
                ));
            }
        }

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks
                (title, description, category_id, priority, expected_duration,
                 start_date, due_date, client_id, assigned_to, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            {RETURNING_TASK}
            "#,
        ))
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(dto.category_id)
        .bind(&dto.priority)
        .bind(dto.expected_duration)
        .bind(dto.start_date)
        .bind(dto.due_date)
        .bind(dto.client_id)
        .bind(dto.assigned_to)
        .bind(user.id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        Self::record_history(db, task.id, "CREATE", "Task created", user.id, None, None).await?;

        if let Some(assigned_to) = dto.assigned_to {
            Self::notify_assignee(
                db,
                assigned_to,
                "New task assigned",
                &format!("You have been assigned a new task: {}", task.title),
                task.id,
            )
            .await?;
        }

        audit::record(
            db,
            Some(user.id),
            "CREATE_TASK",
            Some("TASK"),
            Some(task.id),
            json!({ "title": dto.title }),
        )
        .await;

        Ok(task)
    }

    #[instrument(skip(db, dto))]
    pub async fn update(
        db: &PgPool,
        actor_id: Uuid,
        id: Uuid,
        dto: UpdateTaskDto,
    ) -> Result<Task, AppError> {
        if let Some(priority) = dto.priority.as_deref()
            && !VALID_PRIORITIES.contains(&priority)
        {
            return Err(AppError::bad_request("VALIDATION_ERROR", "Invalid priority"));
        }

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE tasks SET ");
        let mut fields = query.separated(", ");
        let mut any = false;

        if let Some(title) = &dto.title {
            fields.push("title = ").push_bind_unseparated(title.clone());
            any = true;
        }
        if let Some(description) = &dto.description {
            fields
                .push("description = ")
                .push_bind_unseparated(description.clone());
            any = true;
        }
        if let Some(category_id) = dto.category_id {
            fields.push("category_id = ").push_bind_unseparated(category_id);
            any = true;
        }
        if let Some(priority) = &dto.priority {
            fields.push("priority = ").push_bind_unseparated(priority.clone());
            any = true;
        }
        if let Some(duration) = dto.expected_duration {
            fields.push("expected_duration = ").push_bind_unseparated(duration);
            any = true;
        }
        if let Some(start_date) = dto.start_date {
            fields.push("start_date = ").push_bind_unseparated(start_date);
            any = true;
        }
        if let Some(due_date) = dto.due_date {
            fields.push("due_date = ").push_bind_unseparated(due_date);
            any = true;
        }
        if let Some(client_id) = dto.client_id {
            fields.push("client_id = ").push_bind_unseparated(client_id);
            any = true;
        }
        if let Some(assigned_to) = dto.assigned_to {
            fields.push("assigned_to = ").push_bind_unseparated(assigned_to);
            any = true;
        }

        if !any {
            return Err(AppError::bad_request("NO_UPDATE_FIELDS", "No fields to update"));
        }

        fields.push("updated_at = now()");
        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" AND deleted_at IS NULL ");
        query.push(RETURNING_TASK);

        let task = query
            .build_query_as::<Task>()
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found("TASK_NOT_FOUND", "Task not found"))?;

        Self::record_history(db, id, "UPDATE", "Task updated", actor_id, None, None).await?;

        audit::record(db, Some(actor_id), "UPDATE_TASK", Some("TASK"), Some(id), json!({})).await;

        Ok(task)
    }

    /// Moves a task through its status lifecycle, recording the transition and
    /// notifying the assignee when someone else made the change.
    #[instrument(skip(db, user, dto), fields(user_id = %user.id, status = %dto.status))]
    pub async fn update_status(
        db: &PgPool,
        user: &CurrentUser,
        id: Uuid,
        dto: UpdateTaskStatusDto,
    ) -> Result<Task, AppError> {
        if !VALID_STATUSES.contains(&dto.status.as_str()) {
            return Err(AppError::bad_request("INVALID_STATUS", "Invalid status"));
        }

        let current = sqlx::query_as::<_, TaskStateRow>(
            "SELECT status, assigned_to FROM tasks WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found("TASK_NOT_FOUND", "Task not found"))?;

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $1,
                progress_percentage = COALESCE($2, progress_percentage),
                completed_at = CASE WHEN $1 = 'completed' THEN now() ELSE NULL END,
                updated_at = now()
            WHERE id = $3 AND deleted_at IS NULL
            {RETURNING_TASK}
            "#,
        ))
        .bind(&dto.status)
        .bind(dto.progress_percentage)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        Self::record_history(
            db,
            id,
            "STATUS_CHANGE",
            &format!("Status changed from {} to {}", current.status, dto.status),
            user.id,
            Some(json!({ "status": current.status })),
            Some(json!({
                "status": dto.status,
                "progress_percentage": dto.progress_percentage,
                "notes": dto.notes,
            })),
        )
        .await?;

        if let Some(assigned_to) = current.assigned_to {
            Self::notify_assignee_except(
                db,
                assigned_to,
                user.id,
                "Task status updated",
                &format!("Task status changed to: {}", dto.status),
                id,
            )
            .await?;
        }

        Ok(task)
    }

    #[instrument(skip(db, dto))]
    pub async fn comment(
        db: &PgPool,
        actor_id: Uuid,
        id: Uuid,
        dto: CreateTaskCommentDto,
    ) -> Result<TaskComment, AppError> {
        let exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM tasks WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?;

        if exists.is_none() {
            return Err(AppError::not_found("TASK_NOT_FOUND", "Task not found"));
        }

        sqlx::query_as::<_, TaskComment>(
            r#"
            WITH inserted AS (
                INSERT INTO task_comments (task_id, comment, commented_by)
                VALUES ($1, $2, $3)
                RETURNING id, task_id, comment, commented_by, created_at
            )
            SELECT i.id, i.task_id, i.comment, i.commented_by,
                   u.email AS commented_by_email, e.full_name AS commented_by_name,
                   i.created_at
            FROM inserted i
            LEFT JOIN users u ON u.id = i.commented_by
            LEFT JOIN employees e ON e.user_id = u.id
            "#,
        )
        .bind(id)
        .bind(dto.comment.trim())
        .bind(actor_id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)
    }

    /// Tasks assigned to the caller, most urgent first. Requires an employee
    /// profile.
    #[instrument(skip(db, params))]
    pub async fn my_tasks(
        db: &PgPool,
        user_id: Uuid,
        params: &MyTasksParams,
    ) -> Result<Vec<TaskListItem>, AppError> {
        let employee_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM employees WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found("EMPLOYEE_NOT_FOUND", "Employee profile not found"))?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_TASK_LIST);
        query.push(" WHERE t.deleted_at IS NULL AND t.assigned_to = ");
        query.push_bind(employee_id);

        if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
            query.push(" AND t.status = ");
            query.push_bind(status.to_string());
        }
        if let Some(priority) = params.priority.as_deref().filter(|s| !s.is_empty()) {
            query.push(" AND t.priority = ");
            query.push_bind(priority.to_string());
        }
        if params.overdue_only == Some(true) {
            query.push(" AND t.status <> 'completed' AND t.due_date < CURRENT_DATE ");
        }

        query.push(
            r#" ORDER BY CASE t.priority
                    WHEN 'urgent' THEN 0
                    WHEN 'high' THEN 1
                    WHEN 'medium' THEN 2
                    ELSE 3
                END,
                t.due_date ASC NULLS LAST"#,
        );

        query
            .build_query_as::<TaskListItem>()
            .fetch_all(db)
            .await
            .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn categories(db: &PgPool) -> Result<Vec<TaskCategory>, AppError> {
        sqlx::query_as::<_, TaskCategory>(
            r#"
            SELECT tc.id, tc.specialization_id, tc.name,
                   s.name AS specialization_name, tc.is_active, tc.created_at
            FROM task_categories tc
            LEFT JOIN specializations s ON s.id = tc.specialization_id
            WHERE tc.is_active = true
            ORDER BY tc.name
            "#,
        )
        .fetch_all(db)
        .await
        .map_err(AppError::database)
    }

    async fn record_history(
        db: &PgPool,
        task_id: Uuid,
        action_type: &str,
        description: &str,
        performed_by: Uuid,
        old_values: Option<serde_json::Value>,
        new_values: Option<serde_json::Value>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO task_history
                (task_id, action_type, action_description, performed_by, old_values, new_values)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(task_id)
        .bind(action_type)
        .bind(description)
        .bind(performed_by)
        .bind(old_values)
        .bind(new_values)
        .execute(db)
        .await
        .map_err(AppError::database)?;

        Ok(())
    }

    async fn notify_assignee(
        db: &PgPool,
        employee_id: Uuid,
        title: &str,
        message: &str,
        task_id: Uuid,
    ) -> Result<(), AppError> {
        let user_id =
            sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM employees WHERE id = $1")
                .bind(employee_id)
                .fetch_optional(db)
                .await
                .map_err(AppError::database)?;

        if let Some(user_id) = user_id {
            NotificationsService::notify(db, user_id, title, message, "task", Some(task_id), Some("task"))
                .await;
        }

        Ok(())
    }

    /// Same as [`notify_assignee`](Self::notify_assignee) but skips the actor,
    /// so people are not notified about their own changes.
    async fn notify_assignee_except(
        db: &PgPool,
        employee_id: Uuid,
        actor_user_id: Uuid,
        title: &str,
        message: &str,
        task_id: Uuid,
    ) -> Result<(), AppError> {
        let user_id =
            sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM employees WHERE id = $1")
                .bind(employee_id)
                .fetch_optional(db)
                .await
                .map_err(AppError::database)?;

        if let Some(user_id) = user_id
            && user_id != actor_user_id
        {
            NotificationsService::notify(db, user_id, title, message, "task", Some(task_id), Some("task"))
                .await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_whitelist_falls_back_to_created_at() {
        assert_eq!(parse_sort(None), ("t.created_at", "DESC"));
        assert_eq!(parse_sort(Some("due_date:asc")), ("t.due_date", "ASC"));
        assert_eq!(parse_sort(Some("title:desc")), ("t.title", "DESC"));
        assert_eq!(
            parse_sort(Some("1; DROP TABLE tasks:asc")),
            ("t.created_at", "ASC")
        );
        assert_eq!(parse_sort(Some("priority")), ("t.created_at", "DESC"));
        assert_eq!(parse_sort(Some("status:sideways")), ("t.status", "DESC"));
    }

    #[test]
    fn priority_and_status_whitelists() {
        assert!(VALID_PRIORITIES.contains(&"urgent"));
        assert!(!VALID_PRIORITIES.contains(&"critical"));
        assert!(VALID_STATUSES.contains(&"under_review"));
        assert!(!VALID_STATUSES.contains(&"done"));
    }
}
