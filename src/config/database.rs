//! PostgreSQL connection pool initialization.
//!
//! Reads the connection string from `DATABASE_URL` and panics if it is unset
//! or unreachable; there is nothing useful the server can do without a
//! database.

use sqlx::PgPool;
use std::env;

/// Initializes the connection pool. Called once at startup; the returned pool
/// is cheaply cloneable and lives in [`crate::state::AppState`].
pub async fn init_db_pool() -> PgPool {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database")
}
