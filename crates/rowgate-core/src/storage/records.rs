//! Repository for the two-column record table.
//!
//! Each call scopes its own connection: the pooled connection is returned
//! and any open transaction rolled back when the guards drop, whether the
//! call returns normally or bails out with `?`.

use sqlx::{AnyPool, Connection};
use tracing::{debug, instrument};

use crate::{
    database::Driver,
    error::Result,
    models::{EventRow, RecordSet, TableName},
};

/// Repository for record table operations.
#[derive(Clone)]
pub struct Repository {
    pool: AnyPool,
    table: TableName,
    insert_sql: String,
    select_sql: String,
}

impl Repository {
    /// Creates a repository and renders its statements for `driver`.
    pub fn new(pool: AnyPool, driver: Driver, table: TableName) -> Self {
        let insert_sql = format!(
            "INSERT INTO {table} (column1, column2) VALUES ({}, {})",
            driver.placeholder(1),
            driver.placeholder(2)
        );
        let select_sql = format!("SELECT * FROM {table}");

        Self { pool, table, insert_sql, select_sql }
    }

    /// Name of the table this repository targets.
    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Rendered insert statement.
    pub fn insert_statement(&self) -> &str {
        &self.insert_sql
    }

    /// Rendered select statement.
    pub fn select_statement(&self) -> &str {
        &self.select_sql
    }

    /// Inserts one row and commits.
    ///
    /// The insert runs inside its own transaction. Nothing is persisted
    /// unless the commit succeeds.
    ///
    /// # Errors
    ///
    /// Returns `RowgateError::Connectivity` if no connection can be acquired
    /// and `RowgateError::Statement` if the insert or commit is rejected.
    #[instrument(name = "records_insert", skip(self, row), fields(table = %self.table))]
    pub async fn insert(&self, row: &EventRow) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        sqlx::query(&self.insert_sql)
            .bind(row.column1.as_str())
            .bind(row.column2)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!("Row committed");

        Ok(())
    }

    /// Reads every row of the table into memory.
    ///
    /// There is no row limit: the whole table is materialized before
    /// anything is returned.
    ///
    /// # Errors
    ///
    /// Returns `RowgateError::Connectivity` or `RowgateError::Statement` for
    /// database faults and `RowgateError::Serialization` for values with no
    /// JSON form.
    #[instrument(name = "records_fetch_all", skip(self), fields(table = %self.table))]
    pub async fn fetch_all(&self) -> Result<RecordSet> {
        let rows = {
            let mut conn = self.pool.acquire().await?;
            sqlx::query(&self.select_sql).fetch_all(&mut *conn).await?
        };
        debug!(rows = rows.len(), "Rows fetched");

        RecordSet::from_rows(&rows)
    }

    /// Creates the table when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns error if the DDL statement fails.
    pub async fn ensure_table(&self) -> Result<()> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (column1 TEXT NOT NULL, column2 BIGINT NOT NULL)",
            self.table
        );
        sqlx::query(&ddl).execute(&self.pool).await?;

        debug!(table = %self.table, "Table ensured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_pool() -> AnyPool {
        sqlx::any::install_default_drivers();
        AnyPool::connect_lazy("sqlite::memory:").unwrap()
    }

    #[tokio::test]
    async fn postgres_statements_use_numbered_placeholders() {
        let repo =
            Repository::new(lazy_pool(), Driver::Postgres, TableName::new("your_table").unwrap());

        assert_eq!(
            repo.insert_statement(),
            "INSERT INTO your_table (column1, column2) VALUES ($1, $2)"
        );
        assert_eq!(repo.select_statement(), "SELECT * FROM your_table");
    }

    #[tokio::test]
    async fn sqlite_statements_use_question_marks() {
        let repo = Repository::new(lazy_pool(), Driver::Sqlite, TableName::new("records").unwrap());

        assert_eq!(repo.insert_statement(), "INSERT INTO records (column1, column2) VALUES (?, ?)");
        assert_eq!(repo.table().as_str(), "records");
    }
}
