use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use school_scope::config;
use school_scope::database::{DatabaseManager, PgScopeStore};
use school_scope::handlers::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::config();
    tracing::info!("Starting school-scope in {:?} mode", config.environment);

    let pool = DatabaseManager::pool().await.context("failed to connect to database")?;
    let state = AppState::new(Arc::new(PgScopeStore::new(pool)));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    DatabaseManager::close().await;
    Ok(())
}
