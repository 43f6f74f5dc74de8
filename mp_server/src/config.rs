//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use matchplay::db::{DatabaseConfig, DatabaseConfigError};
use std::net::SocketAddr;
use std::time::Duration;

/// Where tournaments are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local store, lost on restart
    Memory,
    /// PostgreSQL through `DATABASE_URL`
    Postgres,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "memory" => Some(StoreBackend::Memory),
            "postgres" | "postgresql" => Some(StoreBackend::Postgres),
            _ => None,
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Storage backend
    pub backend: StoreBackend,
    /// Database configuration, present for the PostgreSQL backend
    pub database: Option<DatabaseConfig>,
    /// Prometheus scrape address, metrics are disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Interval of the expired check-in sweep
    pub check_in_sweep: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `backend_override` - Optional storage backend override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an invalid value, or if the
    /// PostgreSQL backend is selected without a database URL
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        backend_override: Option<StoreBackend>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_or("SERVER_BIND", SocketAddr::from(([127, 0, 0, 1], 6969)))?,
        };

        let backend = match backend_override {
            Some(backend) => backend,
            None => match std::env::var("STORE_BACKEND") {
                Ok(value) => StoreBackend::parse(&value).ok_or_else(|| ConfigError::Invalid {
                    var: "STORE_BACKEND".to_string(),
                    reason: format!("Unknown backend '{}', use memory or postgres", value),
                })?,
                Err(_) => StoreBackend::Postgres,
            },
        };

        let database = match backend {
            StoreBackend::Memory => None,
            StoreBackend::Postgres => {
                // CLI wins over DATABASE_URL, the pool settings still come from env
                Some(match database_url_override {
                    Some(url) => database_with_url(url)?,
                    None => DatabaseConfig::from_env()?,
                })
            }
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(value) => Some(value.parse().map_err(|_| ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("'{}' is not a socket address", value),
            })?),
            Err(_) => None,
        };

        let check_in_sweep = Duration::from_secs(parse_env_or("CHECK_IN_SWEEP_SECS", 30)?);

        Ok(ServerConfig {
            bind,
            backend,
            database,
            metrics_bind,
            check_in_sweep,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_in_sweep.is_zero() {
            return Err(ConfigError::Invalid {
                var: "CHECK_IN_SWEEP_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if let Some(database) = &self.database {
            if database.max_connections == 0 {
                return Err(ConfigError::Invalid {
                    var: "DB_MAX_CONNECTIONS".to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }

            if database.min_connections > database.max_connections {
                return Err(ConfigError::Invalid {
                    var: "DB_MIN_CONNECTIONS".to_string(),
                    reason: format!(
                        "Cannot exceed max connections ({})",
                        database.max_connections
                    ),
                });
            }
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: "Must differ from the server bind address".to_string(),
            });
        }

        Ok(())
    }
}

/// Database settings from env with the URL taken from the command line
fn database_with_url(url: String) -> Result<DatabaseConfig, ConfigError> {
    let mut config = match DatabaseConfig::from_env() {
        Ok(config) => config,
        Err(DatabaseConfigError::Missing(_)) => DatabaseConfig::development(),
        Err(e) => return Err(e.into()),
    };
    config.database_url = url;
    Ok(config)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

impl From<DatabaseConfigError> for ConfigError {
    fn from(e: DatabaseConfigError) -> Self {
        match e {
            DatabaseConfigError::Missing(var) => ConfigError::MissingRequired {
                var: var.to_string(),
                hint: "Set it, or run with --backend memory".to_string(),
            },
            DatabaseConfigError::Invalid { name, value } => ConfigError::Invalid {
                var: name.to_string(),
                reason: format!("'{}' could not be parsed", value),
            },
        }
    }
}

/// Helper to parse environment variable with default fallback.
///
/// An unset variable yields `default`, a set but unparsable one is an error.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{}' could not be parsed", value),
        }),
        Err(_) => Ok(default),
    }
}
