//! `SQLite` connection pool setup.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use medtrack_app::ports::{EngineProvider, SchemaBootstrapper};
use medtrack_domain::error::InitializationError;

use crate::error::StorageError;

/// Configuration for the embedded `SQLite` engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// `SQLite` connection URL (e.g. `sqlite:medtrack.db` or `sqlite::memory:`).
    pub database_url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl Config {
    /// Private in-memory database, mostly for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }

    /// Read configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `MEDTRACK_DATABASE_URL` is not set.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        Ok(Self {
            database_url: std::env::var("MEDTRACK_DATABASE_URL")?,
            ..Self::default()
        })
    }

    /// Open the engine and create the schema in one step.
    ///
    /// # Errors
    ///
    /// Returns [`InitializationError`] if the connection or schema fails.
    pub async fn build(&self) -> Result<Database, InitializationError> {
        let db = self.open().await?;
        db.bootstrap().await?;
        Ok(db)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:medtrack.db?mode=rwc".to_string(),
            max_connections: 4,
        }
    }
}

impl EngineProvider for Config {
    type Engine = Database;

    async fn open(&self) -> Result<Database, InitializationError> {
        Database::connect(&self.database_url, self.max_connections)
            .await
            .map_err(StorageError::into_open_error)
    }
}

/// An open embedded engine. Cloning shares the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Connect to the database, creating the file if missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the URL is invalid or the connection fails.
    async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        tracing::debug!(url = database_url, "embedded engine opened");

        Ok(Self { pool })
    }

    /// Borrow the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Attaching another execution context to an already open store hands out
/// the same pool.
impl EngineProvider for Database {
    type Engine = Database;

    async fn open(&self) -> Result<Database, InitializationError> {
        Ok(self.clone())
    }
}
