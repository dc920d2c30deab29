use sqlx::PgPool;
use uuid::Uuid;

use super::matrix::PermissionMatrix;

/// Employee profile of an acting user.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EmployeeProfile {
    pub employee_id: Uuid,
    pub department_id: Option<Uuid>,
}

/// Target employee record, reduced to what access checks need.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EmployeeRef {
    pub department_id: Option<Uuid>,
}

/// Target client record. `department_id` is resolved through the client's
/// category and specialization; clients without a category have none.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ClientRef {
    pub assigned_employee_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
}

/// Target task record. `assigned_to` is an employee id, `created_by` a
/// user id.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TaskRef {
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

/// Read-only lookups the access evaluator depends on.
///
/// The evaluator never writes and never fetches more than these projections,
/// so tests can swap in an in-memory implementation.
pub trait Directory {
    fn employee_profile_of(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<EmployeeProfile>, sqlx::Error>> + Send;

    fn employee(
        &self,
        employee_id: Uuid,
    ) -> impl Future<Output = Result<Option<EmployeeRef>, sqlx::Error>> + Send;

    fn client(
        &self,
        client_id: Uuid,
    ) -> impl Future<Output = Result<Option<ClientRef>, sqlx::Error>> + Send;

    fn task(
        &self,
        task_id: Uuid,
    ) -> impl Future<Output = Result<Option<TaskRef>, sqlx::Error>> + Send;

    fn department_of_employee(
        &self,
        employee_id: Uuid,
    ) -> impl Future<Output = Result<Option<Uuid>, sqlx::Error>> + Send;

    fn role_permissions(
        &self,
        role_id: Uuid,
    ) -> impl Future<Output = Result<Option<PermissionMatrix>, sqlx::Error>> + Send;
}

/// Postgres-backed [`Directory`].
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Directory for PgDirectory {
    async fn employee_profile_of(
        &self,
        user_id: Uuid,
    ) -> Result<Option<EmployeeProfile>, sqlx::Error> {
        sqlx::query_as::<_, EmployeeProfile>(
            r#"
            SELECT id AS employee_id, department_id
            FROM employees
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn employee(&self, employee_id: Uuid) -> Result<Option<EmployeeRef>, sqlx::Error> {
        sqlx::query_as::<_, EmployeeRef>(
            r#"
            SELECT department_id
            FROM employees
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn client(&self, client_id: Uuid) -> Result<Option<ClientRef>, sqlx::Error> {
        sqlx::query_as::<_, ClientRef>(
            r#"
            SELECT c.assigned_employee_id, s.department_id
            FROM clients c
            LEFT JOIN client_categories cc ON cc.id = c.category_id
            LEFT JOIN specializations s ON s.id = cc.specialization_id
            WHERE c.id = $1 AND c.deleted_at IS NULL
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn task(&self, task_id: Uuid) -> Result<Option<TaskRef>, sqlx::Error> {
        sqlx::query_as::<_, TaskRef>(
            r#"
            SELECT assigned_to, created_by
            FROM tasks
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn department_of_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let row = sqlx::query_scalar::<_, Option<Uuid>>(
            r#"
            SELECT department_id
            FROM employees
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.flatten())
    }

    async fn role_permissions(
        &self,
        role_id: Uuid,
    ) -> Result<Option<PermissionMatrix>, sqlx::Error> {
        let value = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT permissions FROM roles WHERE id = $1",
        )
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value.map(PermissionMatrix::from_value))
    }
}
