//! Configuration types and parsing for forum.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file names probed in the working directory, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["forum.yml", "forum.yaml"];

/// Prefix of environment variables that override `db.postgres.*`
pub const ENV_PREFIX: &str = "FORUM_DB_POSTGRES_";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection settings
    #[serde(default)]
    pub db: DbConfig,

    /// Migration runner settings
    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// ID generator settings
    #[serde(default)]
    pub snowflake: SnowflakeConfig,
}

/// Database section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DbConfig {
    #[serde(default)]
    pub postgres: PostgresConfig,
}

/// TLS negotiation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// Never negotiate TLS (default)
    #[default]
    Disable,
    /// Use TLS if the server offers it
    Prefer,
    /// Refuse to connect without TLS
    Require,
}

impl std::str::FromStr for SslMode {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            other => Err(CoreError::ConfigInvalid {
                message: format!(
                    "Unknown sslmode '{}'. Valid modes: disable, prefer, require",
                    other
                ),
            }),
        }
    }
}

/// PostgreSQL connection parameters
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostgresConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub pass: String,

    #[serde(default = "default_dbname")]
    pub dbname: String,

    #[serde(default)]
    pub sslmode: SslMode,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            pass: String::new(),
            dbname: default_dbname(),
            sslmode: SslMode::default(),
        }
    }
}

impl std::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("sslmode", &self.sslmode)
            .finish()
    }
}

impl PostgresConfig {
    /// `user@host:port/dbname`, safe for logs
    pub fn summary(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }
}

/// Migration runner section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationsConfig {
    /// Asset base path of the unit tree
    #[serde(default = "default_migrations_base")]
    pub base: String,

    /// Upper bound on concurrently executing units within one round
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            base: default_migrations_base(),
            max_parallel: default_max_parallel(),
        }
    }
}

/// ID generator section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnowflakeConfig {
    /// Epoch of the timestamp field, Unix seconds
    #[serde(default = "default_start_time")]
    pub start_time: i64,

    /// Operator-chosen instance id
    #[serde(default)]
    pub instance_id: i64,
}

impl Default for SnowflakeConfig {
    fn default() -> Self {
        Self {
            start_time: default_start_time(),
            instance_id: 0,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_dbname() -> String {
    "forum".to_string()
}

fn default_migrations_base() -> String {
    "migrations".to_string()
}

fn default_max_parallel() -> usize {
    8
}

/// 2020-01-01T00:00:00Z
fn default_start_time() -> i64 {
    1_577_836_800
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit path must exist. Otherwise `forum.yml`/`forum.yaml` in
    /// `dir` is used when present, and built-in defaults when not.
    /// Environment overrides are applied last, then the result is validated.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> CoreResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => match CONFIG_FILE_NAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|p| p.exists())
            {
                Some(path) => Self::load(&path)?,
                None => {
                    log::debug!("No config file in {}, using defaults", dir.display());
                    Self::default()
                }
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FORUM_DB_POSTGRES_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}{suffix}"));
        let pg = &mut self.db.postgres;

        if let Some(host) = var("HOST") {
            pg.host = host;
        }
        if let Some(port) = var("PORT") {
            pg.port = port.parse().map_err(|_| CoreError::ConfigInvalid {
                message: format!("{ENV_PREFIX}PORT is not a port number: '{port}'"),
            })?;
        }
        if let Some(user) = var("USER") {
            pg.user = user;
        }
        if let Some(pass) = var("PASS") {
            pg.pass = pass;
        }
        if let Some(dbname) = var("DBNAME") {
            pg.dbname = dbname;
        }
        if let Some(sslmode) = var("SSLMODE") {
            pg.sslmode = sslmode.parse()?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        let pg = &self.db.postgres;
        for (field, value) in [("host", &pg.host), ("user", &pg.user), ("dbname", &pg.dbname)] {
            if value.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("db.postgres.{field} cannot be empty"),
                });
            }
        }
        if self.migrations.max_parallel == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "migrations.max_parallel must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
