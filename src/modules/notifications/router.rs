use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

use super::controller::{list_notifications, mark_all_read, mark_read, unread_count};

pub fn init_notifications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", put(mark_all_read))
        .route("/{id}/read", put(mark_read))
}
