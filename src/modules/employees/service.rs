use chrono::Utc;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::access::Role;
use crate::middleware::auth::CurrentUser;
use crate::utils::audit;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{
    CreateEmployeeDto, Employee, EmployeeFilterParams, PaginatedEmployeesResponse,
    UpdateEmployeeDto,
};

const SELECT_EMPLOYEE: &str = r#"
    SELECT e.id, e.user_id, e.employee_number, e.full_name, e.job_title,
           e.department_id, d.name AS department_name,
           e.specialization_id, s.name AS specialization_name,
           e.hire_date, e.employment_status, e.phone, e.created_at
    FROM employees e
    LEFT JOIN departments d ON d.id = e.department_id
    LEFT JOIN specializations s ON s.id = e.specialization_id
"#;

pub struct EmployeesService;

impl EmployeesService {
    /// Role-scoped listing. Senior roles see everything; a Team Leader's view
    /// is restricted to their department, a level-4 user's to their own row.
    /// Accountants have no employee-record rule, so the scope is empty.
    #[instrument(skip(db, user, filters), fields(user_id = %user.id))]
    pub async fn list(
        db: &PgPool,
        user: &CurrentUser,
        filters: &EmployeeFilterParams,
    ) -> Result<PaginatedEmployeesResponse, AppError> {
        let scope = match user.role {
            Role::Owner | Role::DirectManager => Scope::All,
            Role::TeamLeader => {
                let dept = sqlx::query_scalar::<_, Option<Uuid>>(
                    "SELECT department_id FROM employees WHERE user_id = $1 AND deleted_at IS NULL",
                )
                .bind(user.id)
                .fetch_optional(db)
                .await
                .map_err(AppError::database)?
                .flatten();
                match dept {
                    Some(dept) => Scope::Department(dept),
                    None => Scope::Nothing,
                }
            }
            Role::Employee => Scope::SelfOnly(user.id),
            Role::Accountant => Scope::Nothing,
        };

        if matches!(scope, Scope::Nothing) {
            return Ok(PaginatedEmployeesResponse {
                data: vec![],
                meta: PaginationMeta::new(0, &filters.pagination),
            });
        }

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM employees e ");
        let mut list_query: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_EMPLOYEE);

        for query in [&mut count_query, &mut list_query] {
            query.push(" WHERE e.deleted_at IS NULL ");
            match &scope {
                Scope::All => {}
                Scope::Department(dept) => {
                    query.push(" AND e.department_id = ");
                    query.push_bind(*dept);
                }
                Scope::SelfOnly(user_id) => {
                    query.push(" AND e.user_id = ");
                    query.push_bind(*user_id);
                }
                Scope::Nothing => unreachable!(),
            }
            if let Some(search) = filters.search.as_deref().filter(|s| !s.is_empty()) {
                let pattern = format!("%{search}%");
                query.push(" AND (e.full_name ILIKE ");
                query.push_bind(pattern.clone());
                query.push(" OR e.employee_number ILIKE ");
                query.push_bind(pattern);
                query.push(") ");
            }
            if let Some(department_id) = filters.department_id {
                query.push(" AND e.department_id = ");
                query.push_bind(department_id);
            }
        }

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        list_query.push(" ORDER BY e.created_at DESC LIMIT ");
        list_query.push_bind(filters.pagination.limit());
        list_query.push(" OFFSET ");
        list_query.push_bind(filters.pagination.offset());

        let data = list_query
            .build_query_as::<Employee>()
            .fetch_all(db)
            .await
            .map_err(AppError::database)?;

        Ok(PaginatedEmployeesResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, id: Uuid) -> Result<Employee, AppError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_EMPLOYEE);
        query.push(" WHERE e.id = ");
        query.push_bind(id);
        query.push(" AND e.deleted_at IS NULL");

        query
            .build_query_as::<Employee>()
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found("EMPLOYEE_NOT_FOUND", "Employee not found"))
    }

    #[instrument(skip(db, dto))]
    pub async fn create(
        db: &PgPool,
        actor_id: Uuid,
        dto: CreateEmployeeDto,
    ) -> Result<Employee, AppError> {
        let exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM employees WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(dto.user_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?;

        if exists.is_some() {
            return Err(AppError::bad_request(
                "EMPLOYEE_EXISTS",
                "User already has an employee record",
            ));
        }

        let employee_number = format!("EMP{}", Utc::now().timestamp_millis());
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO employees
                (user_id, employee_number, full_name, job_title, department_id,
                 specialization_id, phone, hire_date, employment_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, CURRENT_DATE, 'active')
            RETURNING id
            "#,
        )
        .bind(dto.user_id)
        .bind(&employee_number)
        .bind(&dto.full_name)
        .bind(&dto.job_title)
        .bind(dto.department_id)
        .bind(dto.specialization_id)
        .bind(&dto.phone)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        audit::record(
            db,
            Some(actor_id),
            "CREATE_EMPLOYEE",
            Some("EMPLOYEE"),
            Some(id),
            json!({ "user_id": dto.user_id }),
        )
        .await;

        Self::get(db, id).await
    }

    #[instrument(skip(db, dto))]
    pub async fn update(
        db: &PgPool,
        actor_id: Uuid,
        id: Uuid,
        dto: UpdateEmployeeDto,
    ) -> Result<Employee, AppError> {
        // Existence check first so an empty body still 404s for a bad id.
        Self::get(db, id).await?;

        if dto.full_name.is_none()
            && dto.job_title.is_none()
            && dto.department_id.is_none()
            && dto.specialization_id.is_none()
            && dto.employment_status.is_none()
            && dto.phone.is_none()
        {
            return Err(AppError::bad_request("NO_UPDATE_FIELDS", "No fields to update"));
        }

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE employees SET ");
        let mut fields = query.separated(", ");
        if let Some(full_name) = &dto.full_name {
            fields.push("full_name = ").push_bind_unseparated(full_name.clone());
        }
        if let Some(job_title) = &dto.job_title {
            fields.push("job_title = ").push_bind_unseparated(job_title.clone());
        }
        if let Some(department_id) = dto.department_id {
            fields.push("department_id = ").push_bind_unseparated(department_id);
        }
        if let Some(specialization_id) = dto.specialization_id {
            fields
                .push("specialization_id = ")
                .push_bind_unseparated(specialization_id);
        }
        if let Some(status) = &dto.employment_status {
            fields
                .push("employment_status = ")
                .push_bind_unseparated(status.clone());
        }
        if let Some(phone) = &dto.phone {
            fields.push("phone = ").push_bind_unseparated(phone.clone());
        }
        fields.push("updated_at = now()");
        query.push(" WHERE id = ");
        query.push_bind(id);

        query.build().execute(db).await.map_err(AppError::database)?;

        audit::record(
            db,
            Some(actor_id),
            "UPDATE_EMPLOYEE",
            Some("EMPLOYEE"),
            Some(id),
            json!({}),
        )
        .await;

        Self::get(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, actor_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE employees SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(db)
        .await
        .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("EMPLOYEE_NOT_FOUND", "Employee not found"));
        }

        audit::record(
            db,
            Some(actor_id),
            "DELETE_EMPLOYEE",
            Some("EMPLOYEE"),
            Some(id),
            json!({}),
        )
        .await;

        Ok(())
    }
}

enum Scope {
    All,
    Department(Uuid),
    SelfOnly(Uuid),
    Nothing,
}
