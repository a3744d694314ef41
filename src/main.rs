mod config;
mod db;
mod error;
mod extract;
mod models;
mod payload;
mod routes;

use std::sync::Arc;

use anyhow::Result;
use config::Config;
use db::{MemoryStore, PgStore, Store};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shared state handed to every request handler
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "word_grid_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting word grid API server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let store: Arc<dyn Store> = match config.database_url() {
        Some(url) => {
            let pool = db::create_pool(url, config.database.max_connections).await?;
            tracing::info!("Connected to database");

            let store = PgStore::new(pool);
            store.migrate().await?;
            tracing::info!("Database migrations completed");

            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set. Records are kept in memory and lost on exit.");
            Arc::new(MemoryStore::new())
        }
    };

    let state = Arc::new(AppState::new(store));

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = routes::create_routes()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Games: http://{}/games", addr);
    tracing::info!("Leaderboard: http://{}/leaderboard", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
