//! Configuration management for the rowgate service.

use std::{
    fmt,
    net::SocketAddr,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use rowgate_core::{database::DEFAULT_PORT, DatabaseSettings, Driver, PoolLimits, TableName};
use serde::{Deserialize, Serialize};

/// Default configuration file, relative to the working directory.
pub const CONFIG_FILE: &str = "rowgate.toml";

/// Environment variable that overrides the configuration file path.
pub const CONFIG_PATH_ENV: &str = "ROWGATE_CONFIG";

/// Prefix for environment overrides. Nested keys use `__`, for example
/// `ROWGATE_DATABASE__PASSWORD`.
pub const ENV_PREFIX: &str = "ROWGATE_";

/// Keys whose environment values are taken verbatim. Everything else is
/// parsed, which would turn a password such as `007` into the integer `7`.
const TEXT_KEYS: &[&str] = &[
    "server.host",
    "database.server",
    "database.database",
    "database.username",
    "database.password",
    "database.table",
    "log.filter",
];

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`rowgate.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// Credentials belong in the environment or a secret-mounted file, never in
/// the defaults.
///
/// # Example
///
/// ```no_run
/// use rowgate_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
/// println!("Server will bind to {}:{}", config.server.host, config.server.port);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Database connection, pool and table settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub log: LogConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address.
    ///
    /// Environment variable: `ROWGATE_SERVER__HOST`
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `ROWGATE_SERVER__PORT`
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

/// Database settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Backend driver: `postgres`, `mysql` or `sqlite`.
    ///
    /// Environment variable: `ROWGATE_DATABASE__DRIVER`
    pub driver: Driver,
    /// Database server host.
    ///
    /// Environment variable: `ROWGATE_DATABASE__SERVER`
    pub server: String,
    /// Database server port. The default suits none of the supported
    /// drivers' stock installs; set it for your backend.
    ///
    /// Environment variable: `ROWGATE_DATABASE__PORT`
    pub port: u16,
    /// Database name (file path for SQLite).
    ///
    /// Environment variable: `ROWGATE_DATABASE__DATABASE`
    pub database: String,
    /// Login name.
    ///
    /// Environment variable: `ROWGATE_DATABASE__USERNAME`
    pub username: String,
    /// Login password.
    ///
    /// Environment variable: `ROWGATE_DATABASE__PASSWORD`
    pub password: String,
    /// Table events are written to and queries read from.
    ///
    /// Environment variable: `ROWGATE_DATABASE__TABLE`
    pub table: String,
    /// Maximum number of pooled connections.
    ///
    /// Environment variable: `ROWGATE_DATABASE__MAX_CONNECTIONS`
    pub max_connections: u32,
    /// Connections kept open while idle.
    ///
    /// Environment variable: `ROWGATE_DATABASE__MIN_CONNECTIONS`
    pub min_connections: u32,
    /// Seconds an invocation waits for a pooled connection.
    ///
    /// Environment variable: `ROWGATE_DATABASE__ACQUIRE_TIMEOUT_SECS`
    pub acquire_timeout_secs: u64,
    /// Create the table at startup if it is missing.
    ///
    /// Environment variable: `ROWGATE_DATABASE__ENSURE_TABLE`
    pub ensure_table: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: Driver::Postgres,
            server: "localhost".to_string(),
            port: DEFAULT_PORT,
            database: "rowgate".to_string(),
            username: String::new(),
            password: String::new(),
            table: "records".to_string(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_secs: 10,
            ensure_table: false,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("driver", &self.driver)
            .field("server", &self.server)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("table", &self.table)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("ensure_table", &self.ensure_table)
            .finish()
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Tracing filter directive, overridden by `RUST_LOG` when set.
    ///
    /// Environment variable: `ROWGATE_LOG__FILTER`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "info,rowgate=debug,tower_http=debug".to_string() }
    }
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides.
    ///
    /// The file is `rowgate.toml` unless `ROWGATE_CONFIG` names another path.
    /// A missing file is not an error.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
        Self::load_from(path)
    }

    /// Load configuration using an explicit file path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let env = Env::prefixed(ENV_PREFIX).split("__");

        let mut figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(env.clone().ignore(TEXT_KEYS));

        let text_env = env.only(TEXT_KEYS);
        for (key, value) in text_env.iter() {
            figment = figment.merge(Serialized::default(key.as_str(), value));
        }

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Connection fields for the database layer.
    pub fn database_settings(&self) -> DatabaseSettings {
        DatabaseSettings {
            driver: self.database.driver,
            server: self.database.server.clone(),
            port: self.database.port,
            database: self.database.database.clone(),
            username: self.database.username.clone(),
            password: self.database.password.clone(),
        }
    }

    /// Pool sizing for the database layer.
    pub fn pool_limits(&self) -> PoolLimits {
        PoolLimits {
            max_connections: self.database.max_connections,
            min_connections: self.database.min_connections,
            acquire_timeout: Duration::from_secs(self.database.acquire_timeout_secs),
        }
    }

    /// Validated target table.
    pub fn table_name(&self) -> Result<TableName> {
        TableName::new(self.database.table.as_str()).context("Invalid table name")
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.server.host, self.server.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Get database URL with password masked for logging.
    pub fn database_url_masked(&self) -> String {
        self.database_settings().connection_url_masked()
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server port must be greater than 0");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!("database min_connections cannot exceed max_connections");
        }

        self.table_name()?;
        self.database_settings().validate().context("Invalid database settings")?;

        Ok(())
    }
}
