use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::utils::pagination::{PaginationMeta, PaginationParams};
use crate::utils::serde::deserialize_optional_uuid;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Client {
    pub id: Uuid,
    pub full_name: String,
    pub company_name: Option<String>,
    pub business_field: Option<String>,
    pub primary_phone: String,
    pub primary_email: String,
    pub address: Option<String>,
    pub country: Option<String>,
    pub category_id: Option<Uuid>,
    pub assigned_employee_id: Option<Uuid>,
    pub contract_number: String,
    pub contract_start_date: Option<NaiveDate>,
    pub contract_end_date: Option<NaiveDate>,
    pub contract_value: Option<Decimal>,
    pub status: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Client row for listings, with joined names and payment aggregates.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ClientListItem {
    pub id: Uuid,
    pub full_name: String,
    pub company_name: Option<String>,
    pub primary_phone: String,
    pub primary_email: String,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub specialization_name: Option<String>,
    pub assigned_employee_id: Option<Uuid>,
    pub assigned_employee_name: Option<String>,
    pub contract_number: String,
    pub status: String,
    pub total_paid: Decimal,
    pub outstanding_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Full client view with payment totals.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ClientDetail {
    pub id: Uuid,
    pub full_name: String,
    pub company_name: Option<String>,
    pub business_field: Option<String>,
    pub primary_phone: String,
    pub primary_email: String,
    pub address: Option<String>,
    pub country: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub specialization_id: Option<Uuid>,
    pub specialization_name: Option<String>,
    pub assigned_employee_id: Option<Uuid>,
    pub assigned_employee_name: Option<String>,
    pub assigned_employee_number: Option<String>,
    pub contract_number: String,
    pub contract_start_date: Option<NaiveDate>,
    pub contract_end_date: Option<NaiveDate>,
    pub contract_value: Option<Decimal>,
    pub status: String,
    pub created_by: Option<Uuid>,
    pub total_paid: Decimal,
    pub total_outstanding: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ClientCategory {
    pub id: Uuid,
    pub specialization_id: Option<Uuid>,
    pub name: String,
    pub specialization_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateClientDto {
    #[validate(length(min = 1))]
    pub full_name: String,
    pub company_name: Option<String>,
    pub business_field: Option<String>,
    #[validate(length(min = 1))]
    pub primary_phone: String,
    #[validate(email)]
    pub primary_email: String,
    pub address: Option<String>,
    pub country: Option<String>,
    pub category_id: Option<Uuid>,
    pub assigned_employee_id: Option<Uuid>,
    /// Generated when absent.
    pub contract_number: Option<String>,
    pub contract_start_date: Option<NaiveDate>,
    pub contract_end_date: Option<NaiveDate>,
    pub contract_value: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateClientDto {
    #[validate(length(min = 1))]
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub business_field: Option<String>,
    #[validate(length(min = 1))]
    pub primary_phone: Option<String>,
    #[validate(email)]
    pub primary_email: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub category_id: Option<Uuid>,
    pub assigned_employee_id: Option<Uuid>,
    pub contract_start_date: Option<NaiveDate>,
    pub contract_end_date: Option<NaiveDate>,
    pub contract_value: Option<Decimal>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateClientCategoryDto {
    #[validate(length(min = 1))]
    pub name: String,
    pub specialization_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientFilterParams {
    pub search: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub category_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub assigned_employee_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteClientParams {
    pub permanent: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedClientsResponse {
    pub data: Vec<ClientListItem>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn create_dto() -> CreateClientDto {
        CreateClientDto {
            full_name: "Acme Holdings".into(),
            company_name: None,
            business_field: None,
            primary_phone: "+1555123456".into(),
            primary_email: "billing@acme.test".into(),
            address: None,
            country: None,
            category_id: None,
            assigned_employee_id: None,
            contract_number: None,
            contract_start_date: None,
            contract_end_date: None,
            contract_value: None,
        }
    }

    #[test]
    fn create_dto_requires_contact_fields() {
        let mut dto = create_dto();
        assert!(dto.validate().is_ok());

        dto.primary_email = "not-an-email".into();
        assert!(dto.validate().is_err());

        dto.primary_email = "billing@acme.test".into();
        dto.full_name = String::new();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn update_dto_allows_partial_bodies() {
        let dto = UpdateClientDto {
            full_name: None,
            company_name: None,
            business_field: None,
            primary_phone: None,
            primary_email: None,
            address: None,
            country: None,
            category_id: None,
            assigned_employee_id: None,
            contract_start_date: None,
            contract_end_date: None,
            contract_value: None,
            status: Some("inactive".into()),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn filter_params_tolerate_empty_strings() {
        let params: ClientFilterParams =
            serde_json::from_str(r#"{"category_id": "", "page": "2"}"#).unwrap();
        assert!(params.category_id.is_none());
        assert_eq!(params.pagination.page(), 2);
    }
}
