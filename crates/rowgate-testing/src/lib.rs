//! Test infrastructure for rowgate.
//!
//! Every [`TestEnv`] owns a throwaway SQLite database file in a temporary
//! directory, so tests run in parallel without sharing rows and without a
//! database server.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use rowgate_core::{
    database, DatabaseSettings, Driver, EventRow, PoolLimits, Storage, TableName,
};
use sqlx::AnyPool;
use tempfile::TempDir;
use tracing::debug;

pub mod fixtures;
pub mod http;

pub use fixtures::EventBuilder;
pub use http::TestResponse;

/// Table used by [`TestEnv::new`].
pub const DEFAULT_TABLE: &str = "records";

/// Pool sizing for test databases.
const TEST_POOL_LIMITS: PoolLimits = PoolLimits {
    max_connections: 4,
    min_connections: 0,
    acquire_timeout: Duration::from_secs(5),
};

/// Test environment with an isolated database.
pub struct TestEnv {
    settings: DatabaseSettings,
    table: TableName,
    storage: Storage,
    /// Keeps the database file alive; declared last so it drops last.
    _dir: TempDir,
}

impl TestEnv {
    /// Creates an environment whose record table already exists.
    pub async fn new() -> Result<Self> {
        let env = Self::without_table().await?;
        env.storage.records.ensure_table().await.context("failed to create record table")?;
        Ok(env)
    }

    /// Creates an environment where the record table has not been created.
    pub async fn without_table() -> Result<Self> {
        Self::open(DEFAULT_TABLE).await
    }

    /// Creates an environment bound to `table`, created with `ddl`.
    ///
    /// Used to exercise the query path against arbitrary column layouts.
    pub async fn with_schema(table: &str, ddl: &str) -> Result<Self> {
        let env = Self::open(table).await?;
        sqlx::query(ddl).execute(env.pool()).await.context("failed to apply test schema")?;
        Ok(env)
    }

    async fn open(table: &str) -> Result<Self> {
        init_tracing();

        let dir = tempfile::tempdir().context("failed to create temp dir")?;
        let path = dir.path().join("rowgate.db");
        let settings = DatabaseSettings::sqlite(path.to_string_lossy().into_owned());
        let table = TableName::new(table)?;

        let storage = connect_storage(&settings, &table).await?;
        debug!(url = %settings.connection_url(), "Test database ready");

        Ok(Self { settings, table, storage, _dir: dir })
    }

    /// Access to the underlying database pool.
    pub fn pool(&self) -> &AnyPool {
        self.storage.pool()
    }

    /// Storage layer bound to the environment's table.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Production router wired to this environment's storage.
    pub fn router(&self) -> Router {
        rowgate_api::create_router(self.storage.clone())
    }

    /// Closes the pool. Subsequent operations fail with a connectivity
    /// fault until [`TestEnv::reopen`] is called.
    pub async fn close(&self) {
        self.storage.close().await;
    }

    /// Replaces a closed pool with a fresh one on the same database file.
    pub async fn reopen(&mut self) -> Result<()> {
        self.storage = connect_storage(&self.settings, &self.table).await?;
        Ok(())
    }

    /// Inserts a row directly, bypassing the ingestion path.
    pub async fn insert_raw(&self, column1: &str, column2: i64) -> Result<()> {
        let sql = format!("INSERT INTO {} (column1, column2) VALUES (?, ?)", self.table);
        sqlx::query(&sql)
            .bind(column1)
            .bind(column2)
            .execute(self.pool())
            .await
            .context("failed to insert raw row")?;
        Ok(())
    }

    /// Counts all rows in the table.
    pub async fn count_rows(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(self.pool())
            .await
            .context("failed to count rows")
    }

    /// Counts rows equal to `row` on both columns.
    pub async fn count_matching(&self, row: &EventRow) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE column1 = ? AND column2 = ?", self.table);
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(row.column1.as_str())
            .bind(row.column2)
            .fetch_one(self.pool())
            .await
            .context("failed to count matching rows")
    }
}

async fn connect_storage(settings: &DatabaseSettings, table: &TableName) -> Result<Storage> {
    let pool = database::connect(settings, TEST_POOL_LIMITS)
        .await
        .context("failed to open test database")?;
    Ok(Storage::new(pool, Driver::Sqlite, table.clone()))
}

/// Installs a test-writer subscriber once per process.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .with_test_writer()
        .try_init();
}
