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
    Client, ClientCategory, ClientDetail, ClientFilterParams, ClientListItem,
    CreateClientCategoryDto, CreateClientDto, DeleteClientParams, PaginatedClientsResponse,
    UpdateClientDto,
};

const SELECT_CLIENT_LIST: &str = r#"
    SELECT c.id, c.full_name, c.company_name, c.primary_phone, c.primary_email,
           c.category_id, cc.name AS category_name, s.name AS specialization_name,
           c.assigned_employee_id, e.full_name AS assigned_employee_name,
           c.contract_number, c.status,
           COALESCE((SELECT SUM(p.amount) FROM payments p WHERE p.client_id = c.id), 0)
               AS total_paid,
           (SELECT COUNT(*) FROM outstanding_payments op
            WHERE op.client_id = c.id AND op.status <> 'paid') AS outstanding_count,
           c.created_at
    FROM clients c
    LEFT JOIN client_categories cc ON cc.id = c.category_id
    LEFT JOIN specializations s ON s.id = cc.specialization_id
    LEFT JOIN employees e ON e.id = c.assigned_employee_id
"#;

/// Visibility scope applied to client listings.
enum Scope {
    All,
    Department(Uuid),
    Assigned(Uuid),
    Nothing,
}

pub struct ClientsService;

impl ClientsService {
    /// Role-scoped listing. A Team Leader sees clients whose category belongs
    /// to their department's specializations; a level-4 user sees only clients
    /// assigned to them. Scopes fail closed when the actor has no profile.
    #[instrument(skip(db, user, filters), fields(user_id = %user.id))]
    pub async fn list(
        db: &PgPool,
        user: &CurrentUser,
        filters: &ClientFilterParams,
    ) -> Result<PaginatedClientsResponse, AppError> {
        let scope = match user.role {
            Role::Owner | Role::DirectManager | Role::Accountant => Scope::All,
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
            Role::Employee => {
                let employee_id = sqlx::query_scalar::<_, Uuid>(
                    "SELECT id FROM employees WHERE user_id = $1 AND deleted_at IS NULL",
                )
                .bind(user.id)
                .fetch_optional(db)
                .await
                .map_err(AppError::database)?;
                match employee_id {
                    Some(employee_id) => Scope::Assigned(employee_id),
                    None => Scope::Nothing,
                }
            }
        };

        if matches!(scope, Scope::Nothing) {
            return Ok(PaginatedClientsResponse {
                data: vec![],
                meta: PaginationMeta::new(0, &filters.pagination),
            });
        }

        let mut count_query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT COUNT(*) FROM clients c
            LEFT JOIN client_categories cc ON cc.id = c.category_id
            LEFT JOIN specializations s ON s.id = cc.specialization_id
            "#,
        );
        let mut list_query: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_CLIENT_LIST);

        for query in [&mut count_query, &mut list_query] {
            query.push(" WHERE c.deleted_at IS NULL ");
            match &scope {
                Scope::All => {}
                Scope::Department(dept) => {
                    query.push(" AND s.department_id = ");
                    query.push_bind(*dept);
                }
                Scope::Assigned(employee_id) => {
                    query.push(" AND c.assigned_employee_id = ");
                    query.push_bind(*employee_id);
                }
                Scope::Nothing => unreachable!(),
            }
            if let Some(search) = filters.search.as_deref().filter(|s| !s.is_empty()) {
                let pattern = format!("%{search}%");
                query.push(" AND (c.full_name ILIKE ");
                query.push_bind(pattern.clone());
                query.push(" OR c.company_name ILIKE ");
                query.push_bind(pattern.clone());
                query.push(" OR c.primary_email ILIKE ");
                query.push_bind(pattern);
                query.push(") ");
            }
            if let Some(status) = filters.status.as_deref().filter(|s| !s.is_empty()) {
                query.push(" AND c.status = ");
                query.push_bind(status.to_string());
            }
            if let Some(category_id) = filters.category_id {
                query.push(" AND c.category_id = ");
                query.push_bind(category_id);
            }
            if let Some(assigned) = filters.assigned_employee_id {
                query.push(" AND c.assigned_employee_id = ");
                query.push_bind(assigned);
            }
        }

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        list_query.push(" ORDER BY c.created_at DESC LIMIT ");
        list_query.push_bind(filters.pagination.limit());
        list_query.push(" OFFSET ");
        list_query.push_bind(filters.pagination.offset());

        let data = list_query
            .build_query_as::<ClientListItem>()
            .fetch_all(db)
            .await
            .map_err(AppError::database)?;

        Ok(PaginatedClientsResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, id: Uuid) -> Result<ClientDetail, AppError> {
        sqlx::query_as::<_, ClientDetail>(
            r#"
            SELECT c.id, c.full_name, c.company_name, c.business_field,
                   c.primary_phone, c.primary_email, c.address, c.country,
                   c.category_id, cc.name AS category_name,
                   cc.specialization_id, s.name AS specialization_name,
                   c.assigned_employee_id, e.full_name AS assigned_employee_name,
                   e.employee_number AS assigned_employee_number,
                   c.contract_number, c.contract_start_date, c.contract_end_date,
                   c.contract_value, c.status, c.created_by,
                   COALESCE((SELECT SUM(p.amount) FROM payments p WHERE p.client_id = c.id), 0)
                       AS total_paid,
                   COALESCE((SELECT SUM(op.amount) FROM outstanding_payments op
                             WHERE op.client_id = c.id AND op.status <> 'paid'), 0)
                       AS total_outstanding,
                   c.created_at
            FROM clients c
            LEFT JOIN client_categories cc ON cc.id = c.category_id
            LEFT JOIN specializations s ON s.id = cc.specialization_id
            LEFT JOIN employees e ON e.id = c.assigned_employee_id
            WHERE c.id = $1 AND c.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found("CLIENT_NOT_FOUND", "Client not found"))
    }

    #[instrument(skip(db, dto), fields(full_name = %dto.full_name))]
    pub async fn create(
        db: &PgPool,
        actor_id: Uuid,
        dto: CreateClientDto,
    ) -> Result<Client, AppError> {
        let contract_number = dto
            .contract_number
            .clone()
            .unwrap_or_else(|| format!("CNT{}", Utc::now().timestamp_millis()));

        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients
                (full_name, company_name, business_field, primary_phone, primary_email,
                 address, country, category_id, assigned_employee_id, contract_number,
                 contract_start_date, contract_end_date, contract_value, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'active', $14)
            RETURNING id, full_name, company_name, business_field, primary_phone,
                      primary_email, address, country, category_id, assigned_employee_id,
                      contract_number, contract_start_date, contract_end_date,
                      contract_value, status, created_by, created_at
            "#,
        )
        .bind(&dto.full_name)
        .bind(&dto.company_name)
        .bind(&dto.business_field)
        .bind(&dto.primary_phone)
        .bind(&dto.primary_email)
        .bind(&dto.address)
        .bind(&dto.country)
        .bind(dto.category_id)
        .bind(dto.assigned_employee_id)
        .bind(&contract_number)
        .bind(dto.contract_start_date)
        .bind(dto.contract_end_date)
        .bind(dto.contract_value)
        .bind(actor_id)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::conflict("CONTRACT_NUMBER_EXISTS", "Contract number already in use")
            }
            _ => AppError::database(e),
        })?;

        audit::record(
            db,
            Some(actor_id),
            "CREATE_CLIENT",
            Some("CLIENT"),
            Some(client.id),
            json!({ "full_name": dto.full_name, "contract_number": contract_number }),
        )
        .await;

        Ok(client)
    }

    #[instrument(skip(db, dto))]
    pub async fn update(
        db: &PgPool,
        actor_id: Uuid,
        id: Uuid,
        dto: UpdateClientDto,
    ) -> Result<Client, AppError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE clients SET ");
        let mut fields = query.separated(", ");
        let mut any = false;

        if let Some(full_name) = &dto.full_name {
            fields.push("full_name = ").push_bind_unseparated(full_name.clone());
            any = true;
        }
        if let Some(company_name) = &dto.company_name {
            fields
                .push("company_name = ")
                .push_bind_unseparated(company_name.clone());
            any = true;
        }
        if let Some(business_field) = &dto.business_field {
            fields
                .push("business_field = ")
                .push_bind_unseparated(business_field.clone());
            any = true;
        }
        if let Some(primary_phone) = &dto.primary_phone {
            fields
                .push("primary_phone = ")
                .push_bind_unseparated(primary_phone.clone());
            any = true;
        }
        if let Some(primary_email) = &dto.primary_email {
            fields
                .push("primary_email = ")
                .push_bind_unseparated(primary_email.clone());
            any = true;
        }
        if let Some(address) = &dto.address {
            fields.push("address = ").push_bind_unseparated(address.clone());
            any = true;
        }
        if let Some(country) = &dto.country {
            fields.push("country = ").push_bind_unseparated(country.clone());
            any = true;
        }
        if let Some(category_id) = dto.category_id {
            fields.push("category_id = ").push_bind_unseparated(category_id);
            any = true;
        }
        if let Some(assigned) = dto.assigned_employee_id {
            fields
                .push("assigned_employee_id = ")
                .push_bind_unseparated(assigned);
            any = true;
        }
        if let Some(start) = dto.contract_start_date {
            fields.push("contract_start_date = ").push_bind_unseparated(start);
            any = true;
        }
        if let Some(end) = dto.contract_end_date {
            fields.push("contract_end_date = ").push_bind_unseparated(end);
            any = true;
        }
        if let Some(value) = dto.contract_value {
            fields.push("contract_value = ").push_bind_unseparated(value);
            any = true;
        }
        if let Some(status) = &dto.status {
            fields.push("status = ").push_bind_unseparated(status.clone());
            any = true;
        }

        if !any {
            return Err(AppError::bad_request("NO_UPDATE_FIELDS", "No fields to update"));
        }

        fields.push("updated_at = now()");
        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" AND deleted_at IS NULL");
        query.push(
            r#" RETURNING id, full_name, company_name, business_field, primary_phone,
                primary_email, address, country, category_id, assigned_employee_id,
                contract_number, contract_start_date, contract_end_date,
                contract_value, status, created_by, created_at"#,
        );

        let client = query
            .build_query_as::<Client>()
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found("CLIENT_NOT_FOUND", "Client not found"))?;

        audit::record(db, Some(actor_id), "UPDATE_CLIENT", Some("CLIENT"), Some(id), json!({}))
            .await;

        Ok(client)
    }

    /// Soft delete unless `permanent` is set by the owner. Clients with unpaid
    /// outstanding payments cannot be soft deleted.
    #[instrument(skip(db))]
    pub async fn delete(
        db: &PgPool,
        actor_id: Uuid,
        actor_is_owner: bool,
        id: Uuid,
        params: &DeleteClientParams,
    ) -> Result<&'static str, AppError> {
        let permanent = params.permanent.unwrap_or(false);
        if permanent && !actor_is_owner {
            return Err(AppError::forbidden(
                "PERMANENT_DELETE_DENIED",
                "Only owner can permanently delete clients",
            ));
        }

        let unpaid = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM outstanding_payments WHERE client_id = $1 AND status <> 'paid'",
        )
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        if unpaid > 0 && !permanent {
            return Err(AppError::bad_request(
                "OUTSTANDING_PAYMENTS_EXIST",
                "Cannot delete client with outstanding payments",
            ));
        }

        let result = if permanent {
            sqlx::query("DELETE FROM clients WHERE id = $1")
                .bind(id)
                .execute(db)
                .await
        } else {
            sqlx::query(
                "UPDATE clients SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(id)
            .execute(db)
            .await
        }
        .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("CLIENT_NOT_FOUND", "Client not found"));
        }

        audit::record(
            db,
            Some(actor_id),
            "DELETE_CLIENT",
            Some("CLIENT"),
            Some(id),
            json!({ "permanent": permanent }),
        )
        .await;

        Ok(if permanent {
            "Client permanently deleted"
        } else {
            "Client deactivated successfully"
        })
    }

    #[instrument(skip(db))]
    pub async fn categories(db: &PgPool) -> Result<Vec<ClientCategory>, AppError> {
        sqlx::query_as::<_, ClientCategory>(
            r#"
            SELECT cc.id, cc.specialization_id, cc.name,
                   s.name AS specialization_name, cc.created_at
            FROM client_categories cc
            LEFT JOIN specializations s ON s.id = cc.specialization_id
            ORDER BY cc.name
            "#,
        )
        .fetch_all(db)
        .await
        .map_err(AppError::database)
    }

    #[instrument(skip(db, dto), fields(name = %dto.name))]
    pub async fn create_category(
        db: &PgPool,
        actor_id: Uuid,
        dto: CreateClientCategoryDto,
    ) -> Result<ClientCategory, AppError> {
        let category = sqlx::query_as::<_, ClientCategory>(
            r#"
            WITH inserted AS (
                INSERT INTO client_categories (name, specialization_id)
                VALUES ($1, $2)
                RETURNING id, specialization_id, name, created_at
            )
            SELECT i.id, i.specialization_id, i.name,
                   s.name AS specialization_name, i.created_at
            FROM inserted i
            LEFT JOIN specializations s ON s.id = i.specialization_id
            "#,
        )
        .bind(&dto.name)
        .bind(dto.specialization_id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        audit::record(
            db,
            Some(actor_id),
            "CREATE_CLIENT_CATEGORY",
            Some("CLIENT"),
            Some(category.id),
            json!({ "name": dto.name }),
        )
        .await;

        Ok(category)
    }
}
