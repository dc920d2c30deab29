use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::access::Role;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{
    AuthenticatedUser, ChangePasswordRequest, EmployeeSummary, LoginRequest, LoginResponse,
    MeResponse, MessageResponse, NamedRef, RefreshRequest, RefreshResponse, RoleSummary,
};
use crate::modules::clients::model::{
    Client, ClientCategory, ClientDetail, ClientListItem, CreateClientCategoryDto,
    CreateClientDto, PaginatedClientsResponse, UpdateClientDto,
};
use crate::modules::departments::model::{
    CreateDepartmentDto, CreateSpecializationDto, Department, DepartmentListItem, Specialization,
    UpdateDepartmentDto,
};
use crate::modules::employees::model::{
    CreateEmployeeDto, Employee, PaginatedEmployeesResponse, UpdateEmployeeDto,
};
use crate::modules::financial::model::{
    CreatePaymentDto, FinancialSummary, OutstandingPayment, PaginatedOutstandingResponse,
    PaginatedPaymentsResponse, Payment,
};
use crate::modules::notifications::model::{
    MarkAllReadResponse, Notification, PaginatedNotificationsResponse, UnreadCountResponse,
};
use crate::modules::tasks::model::{
    CreateTaskCommentDto, CreateTaskDto, PaginatedTasksResponse, Task, TaskCategory, TaskComment,
    TaskDetail, TaskHistoryEntry, TaskListItem, TaskView, UpdateTaskDto, UpdateTaskStatusDto,
};
use crate::modules::users::model::{
    CreateUserDto, EmployeeData, PaginatedUsersResponse, UpdateUserDto, User, UserDetail,
    UserListItem,
};
use crate::utils::pagination::PaginationMeta;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::me,
        crate::modules::auth::controller::change_password,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::employees::controller::list_employees,
        crate::modules::employees::controller::get_employee,
        crate::modules::employees::controller::create_employee,
        crate::modules::employees::controller::update_employee,
        crate::modules::employees::controller::delete_employee,
        crate::modules::departments::controller::list_departments,
        crate::modules::departments::controller::get_department,
        crate::modules::departments::controller::list_specializations,
        crate::modules::departments::controller::create_department,
        crate::modules::departments::controller::update_department,
        crate::modules::departments::controller::delete_department,
        crate::modules::departments::controller::create_specialization,
        crate::modules::clients::controller::list_clients,
        crate::modules::clients::controller::get_client,
        crate::modules::clients::controller::create_client,
        crate::modules::clients::controller::update_client,
        crate::modules::clients::controller::delete_client,
        crate::modules::clients::controller::list_client_categories,
        crate::modules::clients::controller::create_client_category,
        crate::modules::tasks::controller::list_tasks,
        crate::modules::tasks::controller::get_task,
        crate::modules::tasks::controller::create_task,
        crate::modules::tasks::controller::update_task,
        crate::modules::tasks::controller::update_task_status,
        crate::modules::tasks::controller::comment_on_task,
        crate::modules::tasks::controller::my_tasks,
        crate::modules::tasks::controller::list_task_categories,
        crate::modules::financial::controller::list_payments,
        crate::modules::financial::controller::create_payment,
        crate::modules::financial::controller::list_outstanding,
        crate::modules::financial::controller::financial_summary,
        crate::modules::notifications::controller::list_notifications,
        crate::modules::notifications::controller::unread_count,
        crate::modules::notifications::controller::mark_read,
        crate::modules::notifications::controller::mark_all_read,
    ),
    components(
        schemas(
            Role,
            LoginRequest,
            LoginResponse,
            RefreshRequest,
            RefreshResponse,
            ChangePasswordRequest,
            AuthenticatedUser,
            RoleSummary,
            NamedRef,
            EmployeeSummary,
            MeResponse,
            MessageResponse,
            ErrorResponse,
            User,
            UserListItem,
            UserDetail,
            CreateUserDto,
            UpdateUserDto,
            EmployeeData,
            PaginatedUsersResponse,
            Employee,
            CreateEmployeeDto,
            UpdateEmployeeDto,
            PaginatedEmployeesResponse,
            Department,
            DepartmentListItem,
            Specialization,
            CreateDepartmentDto,
            UpdateDepartmentDto,
            CreateSpecializationDto,
            Client,
            ClientListItem,
            ClientDetail,
            ClientCategory,
            CreateClientDto,
            UpdateClientDto,
            CreateClientCategoryDto,
            PaginatedClientsResponse,
            Task,
            TaskListItem,
            TaskView,
            TaskDetail,
            TaskComment,
            TaskHistoryEntry,
            TaskCategory,
            CreateTaskDto,
            UpdateTaskDto,
            UpdateTaskStatusDto,
            CreateTaskCommentDto,
            PaginatedTasksResponse,
            Payment,
            OutstandingPayment,
            FinancialSummary,
            CreatePaymentDto,
            PaginatedPaymentsResponse,
            PaginatedOutstandingResponse,
            Notification,
            PaginatedNotificationsResponse,
            UnreadCountResponse,
            MarkAllReadResponse,
            PaginationMeta,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, token refresh and session endpoints"),
        (name = "Users", description = "User account management"),
        (name = "Employees", description = "Employee records"),
        (name = "Departments", description = "Departments and specializations"),
        (name = "Clients", description = "Client and contract management"),
        (name = "Tasks", description = "Task assignment and tracking"),
        (name = "Financial", description = "Payments and financial reporting"),
        (name = "Notifications", description = "Per-user notifications")
    ),
    info(
        title = "Opsdesk API",
        version = "0.1.0",
        description = "A business-management REST API built with Rust, Axum, and PostgreSQL featuring hierarchical role-based access control.",
        contact(
            name = "API Support",
            email = "support@opsdesk.dev"
        ),
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
