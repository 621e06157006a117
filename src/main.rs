use kontaktperson_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    identity::{IdentityState, SupabaseIdentity},
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initialises logging, connects to Postgres, wires the identity
/// provider and serves the router.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter: RUST_LOG wins, otherwise verbose for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kontaktperson_portal=debug,tower_http=info,axum=info".into());

    // 3. Pretty logs locally, JSON for the log aggregator in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    if config.env == Env::Production && std::env::var("DEMO_MODE").is_ok() {
        tracing::warn!("DEMO_MODE is ignored in production");
    }

    // 4. Database (Supabase Postgres).
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 5. Identity Provider: Supabase JWTs + role lookup in `profiles`.
    let identity = Arc::new(SupabaseIdentity::new(
        &config.jwt_secret,
        &config.jwt_audience,
        repo.clone(),
    )) as IdentityState;

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(repo, identity, config));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly");
}
