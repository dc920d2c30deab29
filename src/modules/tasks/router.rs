use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{
    comment_on_task, create_task, get_task, list_task_categories, list_tasks, my_tasks,
    update_task, update_task_status,
};

pub fn init_tasks_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/my-tasks", get(my_tasks))
        .route("/categories/all", get(list_task_categories))
        .route("/{id}", get(get_task).put(update_task))
        .route("/{id}/status", put(update_task_status))
        .route("/{id}/comments", post(comment_on_task))
}
