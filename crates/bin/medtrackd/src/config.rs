//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `medtrack.toml` in the working directory. Every field has a
//! default so the file is optional. Environment variables take precedence
//! over file values.

use std::time::Duration;

use serde::Deserialize;

use medtrack_domain::event::DEFAULT_CHANNEL;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Embedded engine settings.
    pub database: DatabaseConfig,
    /// Change channel settings.
    pub channel: ChannelConfig,
    /// Engine call bounds.
    pub engine: EngineConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
    /// Pooled connections shared by every context of this process.
    pub max_connections: u32,
}

/// Change channel configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Channel name, used to label log output.
    pub name: String,
    /// Undelivered events a subscriber may hold before a warning is logged.
    /// Nothing is dropped past this point.
    pub backlog_warning: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on each engine call, in milliseconds. `0` disables it.
    pub query_timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `medtrack.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("medtrack.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("MEDTRACK_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("MEDTRACK_CHANNEL") {
            self.channel.name = val;
        }
        if let Some(val) = lookup("MEDTRACK_QUERY_TIMEOUT_MS")
            && let Ok(ms) = val.parse()
        {
            self.engine.query_timeout_ms = ms;
        }
        if let Some(val) = lookup("MEDTRACK_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "channel name must not be empty".to_string(),
            ));
        }
        if self.channel.backlog_warning == 0 {
            return Err(ConfigError::Validation(
                "channel backlog_warning must be non-zero".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "max_connections must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Bound applied to every engine call, or `None` to wait indefinitely.
    #[must_use]
    pub fn query_timeout(&self) -> Option<Duration> {
        match self.engine.query_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:medtrack.db?mode=rwc".to_string(),
            max_connections: 4,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CHANNEL.to_string(),
            backlog_warning: 64,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 5_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "medtrackd=info,medtrack_app=info,medtrack_adapter_storage_sqlite_sqlx=info"
                .to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
