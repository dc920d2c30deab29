use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{change_password, login, logout, me, refresh};

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
}
