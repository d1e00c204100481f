//! Configuration loading and representation.
//!
//! Read once at startup from the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use lessonhub_observability::LogFormat;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

fn invalid(var: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    /// Root of static assets; images are served from `<static_dir>/images`.
    pub static_dir: PathBuf,
    pub request_log: bool,
    pub seed_demo_catalog: bool,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub const DEFAULT_BIND_ADDR: &'static str = "0.0.0.0:8080";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL");

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid("DATABASE_MAX_CONNECTIONS", "expected a positive integer"))?,
            None => 10,
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| Self::DEFAULT_BIND_ADDR.to_string())
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| invalid("BIND_ADDR", e.to_string()))?;

        let static_dir = PathBuf::from(get("STATIC_DIR").unwrap_or_else(|| "static".to_string()));

        let request_log = match get("REQUEST_LOG") {
            Some(raw) => parse_bool("REQUEST_LOG", &raw)?,
            None => true,
        };

        // Demo data only goes into a real database when asked for.
        let seed_demo_catalog = match get("SEED_DEMO_CATALOG") {
            Some(raw) => parse_bool("SEED_DEMO_CATALOG", &raw)?,
            None => database_url.is_none(),
        };

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|e| invalid("LOG_FORMAT", e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            bind_addr,
            static_dir,
            request_log,
            seed_demo_catalog,
            log_format,
        })
    }

    pub fn images_dir(&self) -> PathBuf {
        self.static_dir.join("images")
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid(var, format!("expected a boolean, got `{other}`"))),
    }
}
