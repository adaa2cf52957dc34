use escrowdesk_config::constants as env_vars;
use escrowdesk_storage::StorageConfig;
use std::env;
use std::num::ParseIntError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub cors_origin: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,
}

fn parse_number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_str =
            env::var(env_vars::PORT).unwrap_or_else(|_| env_vars::DEFAULT_PORT.to_string());

        let port = port_str.trim().parse::<u16>()?;

        // Validate port is in valid range
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let host = env::var(env_vars::HOST).unwrap_or_else(|_| env_vars::DEFAULT_HOST.to_string());

        let cors_origin = env::var(env_vars::CORS_ORIGIN)
            .unwrap_or_else(|_| env_vars::DEFAULT_CORS_ORIGIN.to_string());

        // An empty DATABASE_URL means "no database", same as unset
        let database_url = env::var(env_vars::DATABASE_URL)
            .ok()
            .filter(|url| !url.trim().is_empty());

        let database_max_connections = parse_number(
            env_vars::DATABASE_MAX_CONNECTIONS,
            env_vars::DEFAULT_MAX_CONNECTIONS,
        )?;
        let database_acquire_timeout_secs = parse_number(
            env_vars::DATABASE_ACQUIRE_TIMEOUT_SECS,
            env_vars::DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?;

        Ok(Config {
            port,
            host,
            cors_origin,
            database_url,
            database_max_connections,
            database_acquire_timeout_secs,
        })
    }

    /// Storage backend selected by the presence of a database URL
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            max_connections: self.database_max_connections,
            acquire_timeout_seconds: self.database_acquire_timeout_secs,
            ..StorageConfig::from_database_url(self.database_url.as_deref())
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
