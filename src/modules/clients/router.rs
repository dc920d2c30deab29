use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_client, create_client_category, delete_client, get_client, list_client_categories,
    list_clients, update_client,
};

pub fn init_clients_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/categories", post(create_client_category))
        .route("/categories/all", get(list_client_categories))
        .route(
            "/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
}
