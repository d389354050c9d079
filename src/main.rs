use anyhow::Context;
use tracing_subscriber::EnvFilter;

use school_api::config::{self, AppConfig};
use school_api::database::DatabaseManager;
use school_api::is_production;
use school_api::services::ensure_super_admin;
use school_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("school_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config: &AppConfig = config::config();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting School API in {:?} mode", config.environment);
    if !is_production!() && config.database.url.is_none() {
        tracing::info!("No DATABASE_URL set; data lives in memory until shutdown");
    }

    let store = DatabaseManager::open_store(&config.database)
        .await
        .context("failed to open document store")?;

    if ensure_super_admin(store.as_ref(), &config.bootstrap)
        .await
        .context("failed to create bootstrap admin")?
    {
        tracing::info!("Bootstrap SuperAdmin ready");
    }

    let state = AppState::new(config.clone(), store).context("failed to initialise JWT keys")?;
    let app = school_api::app(state);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("School API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
