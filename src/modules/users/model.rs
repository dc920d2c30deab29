use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::utils::pagination::{PaginationMeta, PaginationParams};
use crate::utils::serde::{deserialize_optional_bool, deserialize_optional_uuid};

/// A user account as returned from list and create endpoints.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role_id: Uuid,
    pub is_active: bool,
    pub is_owner: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// List row: user joined with role and employee summary.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserListItem {
    pub id: Uuid,
    pub email: String,
    pub role_id: Uuid,
    pub role_name: String,
    pub role_level: i16,
    pub is_active: bool,
    pub is_owner: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub employee_number: Option<String>,
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub department_name: Option<String>,
}

/// Detail row for `GET /users/{id}`.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserDetail {
    pub id: Uuid,
    pub email: String,
    pub role_id: Uuid,
    pub role_name: String,
    pub role_level: i16,
    pub is_active: bool,
    pub is_owner: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub employee_id: Option<Uuid>,
    pub employee_number: Option<String>,
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub department_id: Option<Uuid>,
    pub department_name: Option<String>,
    pub specialization_id: Option<Uuid>,
    pub specialization_name: Option<String>,
}

/// Embedded employee record created together with a user.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EmployeeData {
    #[validate(length(min = 1))]
    pub full_name: String,
    pub job_title: Option<String>,
    pub department_id: Option<Uuid>,
    pub specialization_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub role_id: Uuid,
    #[validate(nested)]
    pub employee: Option<EmployeeData>,
}

/// All fields optional; an empty body is rejected with `NO_UPDATE_FIELDS`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserFilterParams {
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub role_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeleteUserParams {
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub permanent: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<UserListItem>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_dto_validation() {
        let dto = CreateUserDto {
            email: "a@b.co".to_string(),
            password: "secret1".to_string(),
            role_id: Uuid::new_v4(),
            employee: None,
        };
        assert!(dto.validate().is_ok());

        let dto = CreateUserDto {
            email: "bad".to_string(),
            password: "secret1".to_string(),
            role_id: Uuid::new_v4(),
            employee: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_nested_employee_validation() {
        let dto = CreateUserDto {
            email: "a@b.co".to_string(),
            password: "secret1".to_string(),
            role_id: Uuid::new_v4(),
            employee: Some(EmployeeData {
                full_name: "".to_string(),
                job_title: None,
                department_id: None,
                specialization_id: None,
            }),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_filter_params_tolerate_empty_query_values() {
        let params: UserFilterParams =
            serde_json::from_str(r#"{"search":"ann","role_id":"","is_active":"","page":"2"}"#)
                .unwrap();
        assert_eq!(params.search.as_deref(), Some("ann"));
        assert_eq!(params.role_id, None);
        assert_eq!(params.is_active, None);
        assert_eq!(params.pagination.page(), 2);
    }
}
