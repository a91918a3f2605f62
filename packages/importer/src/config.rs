use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

use crate::error::{ImportError, Result};

/// Credentials file consulted for `--connection`, relative to the home directory.
pub const CREDENTIALS_FILE_NAME: &str = ".postgres";

/// Port used when a credentials entry names none.
pub const DEFAULT_PORT: u16 = 5432;

/// Overrides the credentials file location.
pub const CREDENTIALS_PATH_VAR: &str = "OSM_HISTORY_CREDENTIALS";

/// One named entry of the credentials file.
///
/// ```yaml
/// local:
///   host: localhost
///   user: osm
///   password: secret
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSettings {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub connect_options: PgConnectOptions,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ImportError::Config("DATABASE_URL not set".into()))?;

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        Ok(Self::from_url(&database_url)?.with_max_connections(max_connections))
    }

    pub fn from_url(database_url: &str) -> Result<Self> {
        let connect_options = database_url
            .parse::<PgConnectOptions>()
            .map_err(|e| ImportError::Config(format!("invalid database URL: {e}")))?;
        Ok(Self::new(connect_options))
    }

    /// Build a config from a named entry of a credentials file.
    ///
    /// `database` overrides the entry's own database name; one of the two is required.
    pub fn from_credentials(
        path: &Path,
        connection: &str,
        database: Option<&str>,
    ) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ImportError::Config(format!(
                "cannot read credentials file {}: {e}",
                path.display()
            ))
        })?;
        let mut entries: BTreeMap<String, ConnectionSettings> =
            serde_yaml_ng::from_str(&content)?;
        let settings = entries.remove(connection).ok_or_else(|| {
            ImportError::Config(format!(
                "connection '{connection}' not found in {}",
                path.display()
            ))
        })?;

        let database = database
            .map(String::from)
            .or(settings.database.clone())
            .ok_or_else(|| {
                ImportError::Config(format!("no database given for connection '{connection}'"))
            })?;

        Ok(Self::new(settings.connect_options(&database)))
    }

    /// Resolve the CLI's `--connection` / `--database` pair.
    ///
    /// Without a connection name, `DATABASE_URL` is used and `database`
    /// only replaces its database name.
    pub fn resolve(connection: Option<&str>, database: Option<&str>) -> Result<Self> {
        match connection {
            Some(name) => Self::from_credentials(&credentials_path()?, name, database),
            None => {
                let mut config = Self::from_env()?;
                if let Some(database) = database {
                    config.connect_options = config.connect_options.database(database);
                }
                Ok(config)
            }
        }
    }

    pub fn new(connect_options: PgConnectOptions) -> Self {
        Self {
            connect_options,
            max_connections: 1,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

impl ConnectionSettings {
    fn connect_options(&self, database: &str) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port.unwrap_or(DEFAULT_PORT))
            .username(&self.user)
            .database(database);
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        options
    }
}

/// Location of the credentials file: `$OSM_HISTORY_CREDENTIALS` or `~/.postgres`.
pub fn credentials_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CREDENTIALS_PATH_VAR) {
        return Ok(PathBuf::from(path));
    }
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(CREDENTIALS_FILE_NAME))
        .ok_or_else(|| ImportError::Config("HOME not set, cannot locate credentials".into()))
}
