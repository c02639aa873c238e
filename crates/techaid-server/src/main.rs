//! TechAid Server: application entry point.

use anyhow::Context;
use techaid_db::DbManager;
use techaid_server::{AppConfig, AppState, router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("techaid=info")),
        )
        .json()
        .init();

    tracing::info!("Starting TechAid server...");

    let config = AppConfig::load()?;

    let db = DbManager::connect(&config.database)
        .await
        .context("Failed to connect to SurrealDB")?;
    techaid_db::run_migrations(db.client())
        .await
        .context("Failed to run migrations")?;

    let state = AppState::new(db.client().clone(), &config)?;
    let app = router(state, config.server.cors_origin.as_deref());

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!(address = %config.server.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("Server error")?;

    tracing::info!("TechAid server stopped.");
    Ok(())
}
