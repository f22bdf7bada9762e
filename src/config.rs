// src/config.rs
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    pub host: IpAddr,
    pub port: u16,
    pub jwt_secret: String,
}

impl Config {
    /// Reads configuration from the process environment (after `.env` has
    /// been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let host = match lookup("HOST") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { name: "HOST", value: raw })?,
            None => IpAddr::from([127, 0, 0, 1]),
        };
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { name: "PORT", value: raw })?,
            None => 3000,
        };
        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .ok()
                .filter(|n: &u32| *n > 0)
                .ok_or(ConfigError::Invalid { name: "DATABASE_MAX_CONNECTIONS", value: raw })?,
            None => 10,
        };
        let run_migrations = lookup("RUN_MIGRATIONS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Config {
            database_url,
            database_max_connections,
            run_migrations,
            host,
            port,
            jwt_secret,
        })
    }
}
