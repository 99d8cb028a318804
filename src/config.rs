//! Process configuration from environment variables (`.env` is loaded by the binary first).

use crate::error::ConfigError;
use sqlx::postgres::PgConnectOptions;
use sqlx::ConnectOptions;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost.tiangolo.com",
    "https://localhost.tiangolo.com",
    "http://localhost",
    "http://localhost:8080",
];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DbConfig,
    pub server: ServerConfig,
}

/// Connection target and pool tuning. The five `DB_*` credentials are required.
#[derive(Clone)]
pub struct DbConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub max_connections: u32,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
    /// Log every statement sqlx runs. Off unless `DB_LOG_STATEMENTS=true`.
    pub log_statements: bool,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(AppConfig {
            database: DbConfig::from_lookup(&lookup)?,
            server: ServerConfig::from_lookup(&lookup)?,
        })
    }
}

impl DbConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(DbConfig {
            user: required(lookup, "DB_USER")?,
            password: required(lookup, "DB_PASSWORD")?,
            host: required(lookup, "DB_HOST")?,
            port: parse("DB_PORT", &required(lookup, "DB_PORT")?)?,
            name: required(lookup, "DB_NAME")?,
            max_connections: optional(lookup, "DB_MAX_CONNECTIONS", 10)?,
            max_lifetime: Duration::from_secs(optional(lookup, "DB_MAX_LIFETIME_SECS", 3600)?),
            acquire_timeout: Duration::from_secs(optional(lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?),
            log_statements: optional(lookup, "DB_LOG_STATEMENTS", false)?,
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name);
        if self.log_statements {
            options
        } else {
            options.disable_statement_logging()
        }
    }

    /// Connection target safe to log.
    pub fn redacted_url(&self) -> String {
        format!(
            "postgres://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.name
        )
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("target", &self.redacted_url())
            .field("max_connections", &self.max_connections)
            .field("max_lifetime", &self.max_lifetime)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("log_statements", &self.log_statements)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };
        Ok(ServerConfig {
            bind_addr: optional(lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8000)))?,
            cors_origins,
            request_timeout: Duration::from_secs(optional(lookup, "REQUEST_TIMEOUT_SECS", 30)?),
            max_body_bytes: optional(lookup, "MAX_BODY_BYTES", 64 * 1024)?,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 64 * 1024,
        }
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn optional<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => parse(key, &raw),
        _ => Ok(default),
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })
}
