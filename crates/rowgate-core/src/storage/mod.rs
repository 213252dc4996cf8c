//! Database access layer.
//!
//! All SQL the service runs lives under this module. Handlers go through
//! [`Storage`] so statement text and placeholder syntax stay in one place.

use sqlx::AnyPool;

pub mod records;

use crate::{database::Driver, error::Result, models::TableName};

/// Container for repository instances sharing one connection pool.
///
/// Cloning is cheap: the pool is reference counted and repositories are
/// immutable once built.
#[derive(Clone)]
pub struct Storage {
    /// Repository for the ingested record table.
    pub records: records::Repository,

    pool: AnyPool,
}

impl Storage {
    /// Creates a storage instance bound to `table`.
    pub fn new(pool: AnyPool, driver: Driver, table: TableName) -> Self {
        Self { records: records::Repository::new(pool.clone(), driver, table), pool }
    }

    /// Returns the shared connection pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Performs a health check on the database connection.
    ///
    /// # Errors
    ///
    /// Returns `RowgateError::Connectivity` if no connection can be made.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
