//! Rowgate service.
//!
//! Main entry point. Loads configuration, opens the database pool and
//! serves the ingestion and query endpoints until shutdown.

use anyhow::{Context, Result};
use rowgate_api::Config;
use rowgate_core::{database, Storage};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config.log.filter)?;

    info!(
        database_url = %config.database_url_masked(),
        table = %config.database.table,
        max_connections = config.database.max_connections,
        "Configuration loaded"
    );

    let addr = config.parse_server_addr()?;
    let table = config.table_name()?;

    let pool = database::connect(&config.database_settings(), config.pool_limits())
        .await
        .context("Failed to create database connection pool")?;

    let storage = Storage::new(pool, config.database.driver, table);
    storage.health_check().await.context("Failed to verify database connection")?;
    info!("Database connection pool established");

    if config.database.ensure_table {
        storage.records.ensure_table().await.context("Failed to create record table")?;
        info!(table = %storage.records.table(), "Record table ensured");
    }

    let result = rowgate_api::start_server(storage.clone(), addr).await;

    storage.close().await;
    info!("Database connections closed");

    result.context("HTTP server failed")?;
    info!("Rowgate shutdown complete");
    Ok(())
}

/// Initializes tracing. `RUST_LOG` takes precedence over the configured
/// filter.
fn init_tracing(default_filter: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("Invalid log filter")?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    Ok(())
}
