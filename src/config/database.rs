//! Database connection configuration
//!
//! Connection settings come from the environment (optionally seeded from a
//! `.env` file). Every option has a default; malformed values are rejected
//! at startup.

use crate::db::retry::RetryPolicy;
use crate::error::{ConfigError, ConfigResult};
use std::fmt;
use std::time::Duration;

/// Database connection configuration
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Database host
    pub host: String,

    /// Database port
    pub port: u16,

    /// Database name
    pub database: String,

    /// Username
    pub username: String,

    /// Password
    pub password: Option<String>,

    /// SSL mode
    pub ssl_mode: SslMode,

    /// Accept the server certificate without verifying its chain
    pub trust_server_certificate: bool,

    /// Timeout for establishing a single connection
    pub connect_timeout: Duration,

    /// Timeout for a single query
    pub request_timeout: Duration,

    /// Upper bound on pooled connections
    pub pool_max: usize,

    /// Connections opened eagerly once the pool is up
    pub pool_min: usize,

    /// Idle connections older than this are dropped; `None` keeps them
    pub pool_idle_timeout: Option<Duration>,

    /// Connection retry policy used during pool initialization
    pub retry: RetryPolicy,
}

/// SSL connection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

impl SslMode {
    fn parse(value: &str) -> ConfigResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            other => Err(ConfigError::Invalid(format!(
                "DB_SSL_MODE must be disable, prefer or require (got '{}')",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "salesboard".to_string(),
            username: "postgres".to_string(),
            password: None,
            ssl_mode: SslMode::Prefer,
            trust_server_certificate: true,
            connect_timeout: Duration::from_millis(30_000),
            request_timeout: Duration::from_millis(30_000),
            pool_max: 10,
            pool_min: 0,
            pool_idle_timeout: Some(Duration::from_millis(30_000)),
            retry: RetryPolicy::default(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("ssl_mode", &self.ssl_mode)
            .field("trust_server_certificate", &self.trust_server_certificate)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("pool_max", &self.pool_max)
            .field("pool_min", &self.pool_min)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl DatabaseConfig {
    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// `DB_SERVER` (`host,port`) takes precedence over `DB_HOST`/`DB_PORT`
    /// and is fatal when malformed. `DB_ENCRYPT` is a boolean shorthand
    /// that overrides `DB_SSL_MODE`.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let (host, port) = match get("DB_SERVER") {
            Some(server) => parse_server(&server)?,
            None => (
                get("DB_HOST").unwrap_or(defaults.host),
                parse_or("DB_PORT", get("DB_PORT"), defaults.port)?,
            ),
        };

        let mut ssl_mode = match get("DB_SSL_MODE") {
            Some(v) => SslMode::parse(&v)?,
            None => defaults.ssl_mode,
        };
        if let Some(encrypt) = get("DB_ENCRYPT") {
            ssl_mode = if parse_bool("DB_ENCRYPT", &encrypt)? {
                SslMode::Require
            } else {
                SslMode::Disable
            };
        }

        let trust_server_certificate = match get("DB_TRUST_SERVER_CERTIFICATE") {
            Some(v) => parse_bool("DB_TRUST_SERVER_CERTIFICATE", &v)?,
            None => defaults.trust_server_certificate,
        };

        let idle_ms: u64 = parse_or("DB_POOL_IDLE_TIMEOUT_MS", get("DB_POOL_IDLE_TIMEOUT_MS"), 30_000)?;
        let retry = RetryPolicy::new(
            parse_or("DB_MAX_RETRIES", get("DB_MAX_RETRIES"), defaults.retry.max_retries)?,
            Duration::from_millis(parse_or("DB_RETRY_DELAY_MS", get("DB_RETRY_DELAY_MS"), 3_000)?),
        );

        let config = Self {
            host,
            port,
            database: get("DB_NAME").unwrap_or(defaults.database),
            username: get("DB_USER").unwrap_or(defaults.username),
            password: lookup("DB_PASSWORD"),
            ssl_mode,
            trust_server_certificate,
            connect_timeout: Duration::from_millis(parse_or(
                "DB_CONNECT_TIMEOUT_MS",
                get("DB_CONNECT_TIMEOUT_MS"),
                30_000,
            )?),
            request_timeout: Duration::from_millis(parse_or(
                "DB_REQUEST_TIMEOUT_MS",
                get("DB_REQUEST_TIMEOUT_MS"),
                30_000,
            )?),
            pool_max: parse_or("DB_POOL_MAX", get("DB_POOL_MAX"), defaults.pool_max)?,
            pool_min: parse_or("DB_POOL_MIN", get("DB_POOL_MIN"), defaults.pool_min)?,
            pool_idle_timeout: (idle_ms > 0).then(|| Duration::from_millis(idle_ms)),
            retry,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("database host is empty".into()));
        }
        if self.pool_max == 0 {
            return Err(ConfigError::Invalid("DB_POOL_MAX must be at least 1".into()));
        }
        if self.pool_min > self.pool_max {
            return Err(ConfigError::Invalid(format!(
                "DB_POOL_MIN ({}) exceeds DB_POOL_MAX ({})",
                self.pool_min, self.pool_max
            )));
        }
        Ok(())
    }

    /// Build a tokio-postgres config for this connection
    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.username)
            .application_name("salesboard")
            .connect_timeout(self.connect_timeout)
            .ssl_mode(match self.ssl_mode {
                SslMode::Disable => tokio_postgres::config::SslMode::Disable,
                SslMode::Prefer => tokio_postgres::config::SslMode::Prefer,
                SslMode::Require => tokio_postgres::config::SslMode::Require,
            });
        if let Some(ref pw) = self.password {
            pg.password(pw);
        }
        pg
    }

    /// Human-readable endpoint, safe to log
    pub fn endpoint(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

/// Parse a `host,port` composite
fn parse_server(value: &str) -> ConfigResult<(String, u16)> {
    let (host, port) = value.split_once(',').ok_or_else(|| {
        ConfigError::Invalid(format!("DB_SERVER must look like 'host,port' (got '{}')", value))
    })?;
    let host = host.trim();
    if host.is_empty() {
        return Err(ConfigError::Invalid("DB_SERVER has an empty host".into()));
    }
    let port = port
        .trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(format!("Invalid port in DB_SERVER: {}", port)))?;
    Ok((host.to_string(), port))
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> ConfigResult<T> {
    match value {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid(format!("Invalid value for {}: {}", key, v))),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(format!(
            "Invalid boolean for {}: {}",
            key, value
        ))),
    }
}
