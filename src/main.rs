//! Fleet Server - vehicle fleet management
//!
//! REST API server for vehicles, clients and assignments.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleet_server::{
    api,
    config::{AppConfig, StorageBackend},
    repository::{MemoryStore, PgStore, Repository},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config);

    tracing::info!("Starting Fleet Server v{}", env!("CARGO_PKG_VERSION"));

    let repository: Repository = match config.storage.backend {
        StorageBackend::Postgres => {
            let store = PgStore::connect(&config.database)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");

            store.migrate().await.context("Failed to run database migrations")?;
            tracing::info!("Database migrations completed");
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState::new(config, repository);
    state
        .services
        .auth
        .ensure_bootstrap_admin()
        .await
        .context("Failed to create bootstrap account")?;

    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("fleet_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
