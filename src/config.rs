//! Server configuration from environment variables (optionally loaded from `.env`).
//!
//! | Variable             | Default                            |
//! |----------------------|------------------------------------|
//! | `DATABASE_URL`       | `postgres://localhost/kittygram`   |
//! | `KITTYGRAM_SCHEMA`   | `kittygram`                        |
//! | `KITTYGRAM_STORAGE`  | `postgres` (or `memory`)           |
//! | `BIND_ADDR`          | `0.0.0.0:3000`                     |
//! | `DB_MAX_CONNECTIONS` | `5`                                |
//! | `MAX_BODY_BYTES`     | `1048576`                          |

use crate::error::ConfigError;
use regex::Regex;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

impl FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageKind::Postgres),
            "memory" | "in-memory" => Ok(StorageKind::Memory),
            _ => Err(ConfigError::UnknownStorage(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    /// PostgreSQL schema holding the tables. Must be a plain identifier.
    pub schema: String,
    pub storage: StorageKind,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/kittygram".into());
        let schema = lookup("KITTYGRAM_SCHEMA").unwrap_or_else(|| "kittygram".into());
        let ident = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").map_err(|e| ConfigError::InvalidValue {
            key: "KITTYGRAM_SCHEMA",
            message: e.to_string(),
        })?;
        if !ident.is_match(&schema) {
            return Err(ConfigError::InvalidValue {
                key: "KITTYGRAM_SCHEMA",
                message: format!("'{}' is not a valid identifier", schema),
            });
        }
        let storage = match lookup("KITTYGRAM_STORAGE") {
            Some(s) => s.parse()?,
            None => StorageKind::Postgres,
        };
        let bind_addr = parse_or(&lookup, "BIND_ADDR", "0.0.0.0:3000".parse().ok())?;
        let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", Some(5))?;
        let max_body_bytes = parse_or(&lookup, "MAX_BODY_BYTES", Some(1024 * 1024))?;
        Ok(ServerConfig {
            database_url,
            schema,
            storage,
            bind_addr,
            max_connections,
            max_body_bytes,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key,
            message: e.to_string(),
        }),
        None => default.ok_or(ConfigError::InvalidValue {
            key,
            message: "no default".into(),
        }),
    }
}
