//! Connection settings and pool construction.
//!
//! The connection string is assembled from discrete settings (driver,
//! server, port, database, username, password) so credentials can be
//! injected from configuration or the environment instead of living in a
//! literal URL.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use sqlx::{any::AnyPoolOptions, AnyPool};
use tracing::debug;

use crate::error::{Result, RowgateError};

/// Default server port.
pub const DEFAULT_PORT: u16 = 1433;

/// Database backend the connection string targets.
///
/// Parsed case-insensitively, with `postgresql` and `mariadb` accepted as
/// aliases. The port is configured separately and defaults to
/// [`DEFAULT_PORT`] for every driver, so Postgres (5432) and MySQL (3306)
/// deployments set it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Driver {
    /// PostgreSQL.
    Postgres,
    /// MySQL or MariaDB.
    Mysql,
    /// SQLite database file; server and credentials are ignored.
    Sqlite,
}

impl Driver {
    /// URL scheme understood by the sqlx `Any` driver.
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Positional parameter placeholder for the 1-based `index`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Self::Postgres => format!("${index}"),
            Self::Mysql | Self::Sqlite => "?".to_string(),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for Driver {
    type Err = RowgateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(RowgateError::Configuration(format!("unsupported database driver {other:?}"))),
        }
    }
}

impl TryFrom<String> for Driver {
    type Error = RowgateError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Recognized connection fields.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Backend driver.
    pub driver: Driver,
    /// Server host name.
    pub server: String,
    /// Server port.
    pub port: u16,
    /// Database name, or the file path for SQLite.
    pub database: String,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("driver", &self.driver)
            .field("server", &self.server)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl DatabaseSettings {
    /// Settings for a SQLite database file, created on first connect.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            driver: Driver::Sqlite,
            server: String::new(),
            port: DEFAULT_PORT,
            database: path.into(),
            username: String::new(),
            password: String::new(),
        }
    }

    /// Assembles the driver-specific connection string.
    pub fn connection_url(&self) -> String {
        self.url_with_password(&urlencoding::encode(&self.password))
    }

    /// Connection string with the password replaced by `***`, for logs.
    pub fn connection_url_masked(&self) -> String {
        self.url_with_password("***")
    }

    fn url_with_password(&self, password: &str) -> String {
        match self.driver {
            Driver::Sqlite => format!("sqlite://{}?mode=rwc", self.database),
            Driver::Postgres | Driver::Mysql => format!(
                "{}://{}:{}@{}:{}/{}",
                self.driver.scheme(),
                urlencoding::encode(&self.username),
                password,
                self.server,
                self.port,
                urlencoding::encode(&self.database),
            ),
        }
    }

    /// Checks that every field the driver needs is present.
    ///
    /// # Errors
    ///
    /// Returns `RowgateError::Configuration` naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        let missing = |field: &str| {
            RowgateError::Configuration(format!("database {field} must be set for {}", self.driver))
        };

        if self.database.is_empty() {
            return Err(missing("database"));
        }
        if self.driver == Driver::Sqlite {
            return Ok(());
        }
        if self.server.is_empty() {
            return Err(missing("server"));
        }
        if self.username.is_empty() {
            return Err(missing("username"));
        }
        if self.port == 0 {
            return Err(RowgateError::Configuration("database port must be greater than 0".into()));
        }
        Ok(())
    }
}

/// Pool sizing handed to the sqlx pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    /// Upper bound on open connections.
    pub max_connections: u32,
    /// Connections kept open while idle.
    pub min_connections: u32,
    /// How long an invocation may wait for a connection.
    pub acquire_timeout: Duration,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self { max_connections: 10, min_connections: 2, acquire_timeout: Duration::from_secs(10) }
    }
}

/// Opens a connection pool for the given settings.
///
/// # Errors
///
/// Returns `RowgateError::Configuration` for incomplete settings and
/// `RowgateError::Connectivity` if the server cannot be reached.
pub async fn connect(settings: &DatabaseSettings, limits: PoolLimits) -> Result<AnyPool> {
    settings.validate()?;
    sqlx::any::install_default_drivers();

    debug!(url = %settings.connection_url_masked(), "Opening database pool");

    let pool = AnyPoolOptions::new()
        .max_connections(limits.max_connections)
        .min_connections(limits.min_connections)
        .acquire_timeout(limits.acquire_timeout)
        .connect(&settings.connection_url())
        .await?;

    Ok(pool)
}
