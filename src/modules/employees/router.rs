use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_employee, delete_employee, get_employee, list_employees, update_employee,
};

pub fn init_employees_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route(
            "/{id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}
