use axum::{Router, middleware, routing::get};

use crate::middleware::access::require_financial_access;
use crate::state::AppState;

use super::controller::{create_payment, financial_summary, list_outstanding, list_payments};

/// Financial routes sit behind a router-level gate so no handler here runs
/// for roles without financial access.
pub fn init_financial_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments).post(create_payment))
        .route("/outstanding", get(list_outstanding))
        .route("/summary", get(financial_summary))
        .route_layer(middleware::from_fn_with_state(state, require_financial_access))
}
