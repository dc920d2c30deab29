use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_department, create_specialization, delete_department, get_department,
    list_departments, list_specializations, update_department,
};

pub fn init_departments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_departments).post(create_department))
        .route(
            "/{id}",
            get(get_department).put(update_department).delete(delete_department),
        )
        .route(
            "/{id}/specializations",
            get(list_specializations).post(create_specialization),
        )
}
