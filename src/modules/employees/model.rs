use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::utils::pagination::{PaginationMeta, PaginationParams};
use crate::utils::serde::deserialize_optional_uuid;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Employee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub employee_number: String,
    pub full_name: String,
    pub job_title: Option<String>,
    pub department_id: Option<Uuid>,
    pub department_name: Option<String>,
    pub specialization_id: Option<Uuid>,
    pub specialization_name: Option<String>,
    pub hire_date: NaiveDate,
    pub employment_status: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEmployeeDto {
    pub user_id: Uuid,
    #[validate(length(min = 1))]
    pub full_name: String,
    pub job_title: Option<String>,
    pub department_id: Option<Uuid>,
    pub specialization_id: Option<Uuid>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployeeDto {
    #[validate(length(min = 1))]
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub department_id: Option<Uuid>,
    pub specialization_id: Option<Uuid>,
    pub employment_status: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EmployeeFilterParams {
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub department_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedEmployeesResponse {
    pub data: Vec<Employee>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_dto_rejects_empty_name() {
        let dto = UpdateEmployeeDto {
            full_name: Some("".to_string()),
            job_title: None,
            department_id: None,
            specialization_id: None,
            employment_status: None,
            phone: None,
        };
        assert!(dto.validate().is_err());
    }
}
