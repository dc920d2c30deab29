use dotenvy::dotenv;

use opsdesk::cli;
use opsdesk::logging::init_tracing;
use opsdesk::router::init_router;
use opsdesk::state::init_app_state;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "create-owner" {
        handle_create_owner(args).await;
        return;
    }

    init_tracing();

    let state = init_app_state().await;
    let app = init_router(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    println!("🚀 Server running on http://localhost:{port}");
    println!("📚 Swagger UI available at http://localhost:{port}/swagger-ui");
    println!("📖 Scalar UI available at http://localhost:{port}/scalar");
    // Connect info is what the rate limiter falls back to for the client IP
    // when no forwarded headers are present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .unwrap();
}

async fn handle_create_owner(args: Vec<String>) {
    if args.len() != 4 {
        eprintln!("Usage: {} create-owner <email> <password>", args[0]);
        std::process::exit(1);
    }

    let email = &args[2];
    let password = &args[3];

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    match cli::create_owner(&pool, email, password).await {
        Ok(_) => {
            println!("✅ Owner created successfully!");
            println!("   Email: {}", email);
        }
        Err(e) => {
            eprintln!("❌ Error creating owner: {}", e);
            std::process::exit(1);
        }
    }
}
