use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::utils::audit;
use crate::utils::errors::AppError;

use super::model::{
    CreateDepartmentDto, CreateSpecializationDto, Department, DepartmentListItem, Specialization,
    UpdateDepartmentDto,
};

pub struct DepartmentsService;

impl DepartmentsService {
    #[instrument(skip(db))]
    pub async fn list(db: &PgPool) -> Result<Vec<DepartmentListItem>, AppError> {
        sqlx::query_as::<_, DepartmentListItem>(
            r#"
            SELECT d.id, d.name, d.description, d.created_at,
                   (SELECT COUNT(*) FROM employees e
                    WHERE e.department_id = d.id AND e.deleted_at IS NULL) AS employee_count,
                   (SELECT COUNT(*) FROM specializations s
                    WHERE s.department_id = d.id) AS specialization_count
            FROM departments d
            ORDER BY d.name
            "#,
        )
        .fetch_all(db)
        .await
        .map_err(AppError::database)
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, id: Uuid) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>(
            "SELECT id, name, description, created_at FROM departments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found("DEPARTMENT_NOT_FOUND", "Department not found"))
    }

    #[instrument(skip(db))]
    pub async fn specializations(db: &PgPool, id: Uuid) -> Result<Vec<Specialization>, AppError> {
        // 404 for an unknown department rather than an empty list.
        Self::get(db, id).await?;

        sqlx::query_as::<_, Specialization>(
            r#"
            SELECT id, department_id, name, created_at
            FROM specializations
            WHERE department_id = $1
            ORDER BY name
            "#,
        )
        .bind(id)
        .fetch_all(db)
        .await
        .map_err(AppError::database)
    }

    #[instrument(skip(db, dto), fields(name = %dto.name))]
    pub async fn create(
        db: &PgPool,
        actor_id: Uuid,
        dto: CreateDepartmentDto,
    ) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(&dto.name)
        .bind(&dto.description)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::conflict("DEPARTMENT_EXISTS", "Department with this name already exists")
            }
            _ => AppError::database(e),
        })?;

        audit::record(
            db,
            Some(actor_id),
            "CREATE_DEPARTMENT",
            Some("DEPARTMENT"),
            Some(department.id),
            json!({ "name": dto.name }),
        )
        .await;

        Ok(department)
    }

    #[instrument(skip(db, dto))]
    pub async fn update(
        db: &PgPool,
        actor_id: Uuid,
        id: Uuid,
        dto: UpdateDepartmentDto,
    ) -> Result<Department, AppError> {
        if dto.name.is_none() && dto.description.is_none() {
            return Err(AppError::bad_request("NO_UPDATE_FIELDS", "No fields to update"));
        }

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE departments SET ");
        let mut fields = query.separated(", ");
        if let Some(name) = &dto.name {
            fields.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(description) = &dto.description {
            fields
                .push("description = ")
                .push_bind_unseparated(description.clone());
        }
        fields.push("updated_at = now()");
        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" RETURNING id, name, description, created_at");

        let department = query
            .build_query_as::<Department>()
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found("DEPARTMENT_NOT_FOUND", "Department not found"))?;

        audit::record(
            db,
            Some(actor_id),
            "UPDATE_DEPARTMENT",
            Some("DEPARTMENT"),
            Some(id),
            json!({}),
        )
        .await;

        Ok(department)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, actor_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let members = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM employees WHERE department_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        if members > 0 {
            return Err(AppError::conflict(
                "DEPARTMENT_NOT_EMPTY",
                "Cannot delete a department that still has employees",
            ));
        }

        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("DEPARTMENT_NOT_FOUND", "Department not found"));
        }

        audit::record(
            db,
            Some(actor_id),
            "DELETE_DEPARTMENT",
            Some("DEPARTMENT"),
            Some(id),
            json!({}),
        )
        .await;

        Ok(())
    }

    #[instrument(skip(db, dto))]
    pub async fn create_specialization(
        db: &PgPool,
        actor_id: Uuid,
        department_id: Uuid,
        dto: CreateSpecializationDto,
    ) -> Result<Specialization, AppError> {
        Self::get(db, department_id).await?;

        let specialization = sqlx::query_as::<_, Specialization>(
            r#"
            INSERT INTO specializations (department_id, name)
            VALUES ($1, $2)
            RETURNING id, department_id, name, created_at
            "#,
        )
        .bind(department_id)
        .bind(&dto.name)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        audit::record(
            db,
            Some(actor_id),
            "CREATE_SPECIALIZATION",
            Some("DEPARTMENT"),
            Some(department_id),
            json!({ "name": dto.name }),
        )
        .await;

        Ok(specialization)
    }
}
