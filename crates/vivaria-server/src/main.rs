//! VIVARIA Server — application entry point.
//!
//! Bootstraps tracing, connects to SurrealDB, applies migrations, and
//! (optionally) seeds the base catalog. The HTTP API layer mounts on
//! top of the husbandry service; transport wiring lives outside this
//! core.

mod config;
mod seed;

use tracing_subscriber::EnvFilter;
use vivaria_db::DbManager;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("vivaria=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting VIVARIA server...");

    let config = ServerConfig::from_env();

    let manager = match DbManager::connect(&config.db).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = vivaria_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Migration failed");
        std::process::exit(1);
    }

    if config.seed {
        if let Err(e) = seed::run(manager.client()).await {
            tracing::error!(error = %e, "Seeding failed");
            std::process::exit(1);
        }
    }

    tracing::info!("VIVARIA ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }

    tracing::info!("VIVARIA server stopped.");
}
