use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pfehub_api::auth::password::hash_password;
use pfehub_api::config::ServerConfig;
use pfehub_api::router::{build_app_router, build_state};
use pfehub_db::fixtures::{seed_demo_data, DEMO_PASSWORD};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pfehub_api=debug,pfehub_db=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        upload_dir = %config.upload_dir.display(),
        "Loaded server configuration"
    );

    // --- Database ---
    let pool = pfehub_db::connect(&config.database_url)
        .await
        .expect("Failed to open database and apply migrations");
    pfehub_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database migrations applied");

    let seeded = pfehub_db::repositories::UserRepo::find_by_email(
        &pool,
        pfehub_db::fixtures::ADMIN_EMAIL,
    )
    .await
    .expect("Failed to query users")
    .is_some();
    if config.seed_demo_data && !seeded {
        let password_hash = hash_password(DEMO_PASSWORD).expect("Failed to hash demo password");
        let summary = seed_demo_data(&pool, &password_hash)
            .await
            .expect("Failed to seed demo data");
        tracing::info!(admin_id = summary.admin_id, "Demo accounts available");
    }

    // --- Uploads ---
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");

    // --- Router ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let app = build_app_router(build_state(pool, config));

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
