//! Service configuration from environment variables.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the storefront API.
    pub api_url: String,
    pub bind_addr: SocketAddr,
    pub http_timeout_secs: u64,
    pub currency: String,
    pub nats_url: Option<String>,
    pub log_level: String,
    pub event_bus_capacity: usize,
}

/// Load configuration, reading a `.env` file first if one exists.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Parsing and validation, decoupled from the process environment so tests
/// can feed a plain map.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let api_url = require("STOREFRONT_API_URL")?;
    if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
        return Err(invalid("STOREFRONT_API_URL", "must start with http:// or https://".into()));
    }

    let port = or_default("PORT", "8083")
        .parse::<u16>()
        .map_err(|e| invalid("PORT", e.to_string()))?;

    let http_timeout_secs = or_default("HTTP_TIMEOUT_SECS", "15")
        .parse::<u64>()
        .map_err(|e| invalid("HTTP_TIMEOUT_SECS", e.to_string()))?;
    if http_timeout_secs == 0 {
        return Err(invalid("HTTP_TIMEOUT_SECS", "must be greater than zero".into()));
    }

    let event_bus_capacity = or_default("EVENT_BUS_CAPACITY", "256")
        .parse::<usize>()
        .map_err(|e| invalid("EVENT_BUS_CAPACITY", e.to_string()))?;
    if event_bus_capacity == 0 {
        return Err(invalid("EVENT_BUS_CAPACITY", "must be greater than zero".into()));
    }

    Ok(AppConfig {
        api_url,
        bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
        http_timeout_secs,
        currency: or_default("CURRENCY", "VND").to_uppercase(),
        nats_url: lookup("NATS_URL").ok().filter(|v| !v.is_empty()),
        log_level: or_default("LOG_LEVEL", "info"),
        event_bus_capacity,
    })
}
