//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use store::DecrementMode;
use thiserror::Error;

/// Which service this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Auth,
    Inventory,
    Price,
    Loyalty,
    Order,
    /// Every service in one process, wired with in-process collaborators.
    Standalone,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Auth => "auth",
            ServiceKind::Inventory => "inventory",
            ServiceKind::Price => "price",
            ServiceKind::Loyalty => "loyalty",
            ServiceKind::Order => "order",
            ServiceKind::Standalone => "standalone",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auth" => Ok(ServiceKind::Auth),
            "inventory" => Ok(ServiceKind::Inventory),
            "price" => Ok(ServiceKind::Price),
            "loyalty" => Ok(ServiceKind::Loyalty),
            "order" => Ok(ServiceKind::Order),
            "standalone" => Ok(ServiceKind::Standalone),
            _ => Err(ConfigError::UnknownService(s.to_string())),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::Invalid {
                var: "LOG_FORMAT",
                value: s.to_string(),
            }),
        }
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "type {0} is not allowed, allowed types: [auth, inventory, price, loyalty, order, standalone]"
    )]
    UnknownService(String),

    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `SERVICE` — service to run (default: `"standalone"`)
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `8080`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `"text"` or `"json"` (default: `"text"`)
/// - `AUTH_URL`, `INVENTORY_URL`, `PRICE_URL`, `LOYALTY_URL` — collaborator base URLs
/// - `UPSTREAM_TIMEOUT_MS` — per-call timeout (default: `2000`)
/// - `UPSTREAM_RETRIES` — retries for idempotent reads, 0 or 1 (default: `1`)
/// - `DECREMENT_MODE` — `"checked"` or `"unchecked"` (default: `"checked"`)
/// - `DATABASE_URL` — PostgreSQL order store; in-memory when unset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub service: ServiceKind,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub auth_url: String,
    pub inventory_url: String,
    pub price_url: String,
    pub loyalty_url: String,
    pub upstream_timeout: Duration,
    pub upstream_retries: u32,
    pub decrement_mode: DecrementMode,
    pub database_url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let decrement_mode = match var("DECREMENT_MODE").as_deref().map(str::trim) {
            None => defaults.decrement_mode,
            Some("checked") => DecrementMode::Checked,
            Some("unchecked") => DecrementMode::Unchecked,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "DECREMENT_MODE",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            service: var("SERVICE")
                .map(|s| s.parse::<ServiceKind>())
                .transpose()?
                .unwrap_or(defaults.service),
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: var("LOG_FORMAT")
                .map(|s| s.parse::<LogFormat>())
                .transpose()?
                .unwrap_or(defaults.log_format),
            auth_url: var("AUTH_URL").unwrap_or(defaults.auth_url),
            inventory_url: var("INVENTORY_URL").unwrap_or(defaults.inventory_url),
            price_url: var("PRICE_URL").unwrap_or(defaults.price_url),
            loyalty_url: var("LOYALTY_URL").unwrap_or(defaults.loyalty_url),
            upstream_timeout: var("UPSTREAM_TIMEOUT_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.upstream_timeout),
            upstream_retries: var("UPSTREAM_RETRIES")
                .and_then(|r| r.parse::<u32>().ok())
                .map(|r| r.min(1))
                .unwrap_or(defaults.upstream_retries),
            decrement_mode,
            database_url: var("DATABASE_URL"),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceKind::Standalone,
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            auth_url: "http://127.0.0.1:8081".to_string(),
            inventory_url: "http://127.0.0.1:8082".to_string(),
            price_url: "http://127.0.0.1:8083".to_string(),
            loyalty_url: "http://127.0.0.1:8084".to_string(),
            upstream_timeout: Duration::from_millis(2000),
            upstream_retries: 1,
            decrement_mode: DecrementMode::Checked,
            database_url: None,
        }
    }
}
