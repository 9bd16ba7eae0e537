use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use task_tracker::agent::{ChatAgent, OllamaAgentService};
use task_tracker::config::{AppConfig, Storage};
use task_tracker::routes;
use task_tracker::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "task_tracker=debug,tower_http=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;

    // ── Agent ─────────────────────────────────────────────────────────────────
    let agent: Arc<dyn ChatAgent> =
        Arc::new(OllamaAgentService::new(&config.ollama_base_url, &config.ollama_model)?);

    // ── Storage ───────────────────────────────────────────────────────────────
    let state = match &config.storage {
        Storage::Postgres { url, max_connections } => {
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database connection established and migrations applied");
            AppState::postgres(pool, agent)
        }
        Storage::InMemory => {
            warn!("USE_INMEMORY is set; data will not survive a restart");
            AppState::in_memory(agent)
        }
    };

    if config.should_seed() {
        let inserted = state.tasks.seed_if_empty().await?;
        if inserted > 0 {
            info!("Seeded {inserted} sample tasks");
        }
    }

    // ── Router ────────────────────────────────────────────────────────────────
    let cors = CorsLayer::new()
        .allow_origin(config.frontend_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    let app = routes::router(state).layer(cors);

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
