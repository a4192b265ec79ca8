//! Relay configuration
//!
//! All settings come from environment variables:
//!
//! | Variable           | Default    | Meaning                                        |
//! |--------------------|------------|------------------------------------------------|
//! | `GIT_PROVIDER`     | `github`   | Provider name, case-insensitive                |
//! | `GIT_URL`          | (empty)    | Custom provider endpoint                       |
//! | `ALLOWED_BRANCHES` | (required) | Colon-delimited list of allowed target branches|
//! | `PORT`             | `8080`     | Listen port                                    |
//! | `BIND_ADDRESS`     | `0.0.0.0`  | Listen address                                 |
//! | `WEBHOOK_PATH`     | `/`        | Path the webhook handler is mounted at         |
//! | `MAX_BODY_BYTES`   | 25 MiB     | Largest accepted request body                  |
//! | `LOG_FORMAT`       | `json`     | `json` or `text`                               |
//!
//! `RUST_LOG` controls the log level and is read by the tracing subscriber.

use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use branch_filter_core::{ConfigurationError, ConfigurationResult, GitProvider};

use crate::{DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT, DEFAULT_WEBHOOK_PATH, HEALTH_PATH};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

pub const GIT_PROVIDER: &str = "GIT_PROVIDER";
pub const GIT_URL: &str = "GIT_URL";
pub const ALLOWED_BRANCHES: &str = "ALLOWED_BRANCHES";
pub const PORT: &str = "PORT";
pub const BIND_ADDRESS: &str = "BIND_ADDRESS";
pub const WEBHOOK_PATH: &str = "WEBHOOK_PATH";
pub const MAX_BODY_BYTES: &str = "MAX_BODY_BYTES";
pub const LOG_FORMAT: &str = "LOG_FORMAT";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,

    /// Human readable text
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" => Ok(Self::Text),
            other => Err(format!("unknown log format '{}', expected 'json' or 'text'", other)),
        }
    }
}

/// Complete relay configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    /// Source-control provider
    pub provider: GitProvider,

    /// Custom provider endpoint; empty selects the public default
    pub endpoint: String,

    /// Raw colon-delimited allow-list; validated when the app state is built
    pub allowed_branches: String,

    /// Address to bind to
    pub host: IpAddr,

    /// Port to listen on
    pub port: u16,

    /// Path the webhook handler is mounted at
    pub webhook_path: String,

    /// Largest request body the handler will buffer
    pub max_body_bytes: usize,

    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            provider: GitProvider::default(),
            endpoint: String::new(),
            allowed_branches: String::new(),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_format: LogFormat::default(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`RelayConfig::from_lookup`].
    pub fn from_env() -> ConfigurationResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidSetting` if a numeric or address
    /// setting does not parse, the webhook path is not absolute or collides
    /// with the health check, or the log format is unknown.
    pub fn from_lookup<F>(lookup: F) -> ConfigurationResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let webhook_path = value(WEBHOOK_PATH).unwrap_or(defaults.webhook_path);
        validate_webhook_path(&webhook_path)?;

        let max_body_bytes = parse_setting(
            MAX_BODY_BYTES,
            value(MAX_BODY_BYTES),
            defaults.max_body_bytes,
        )?;
        if max_body_bytes == 0 {
            return Err(invalid(MAX_BODY_BYTES, "must be greater than zero"));
        }

        Ok(Self {
            provider: GitProvider::from_name(&value(GIT_PROVIDER).unwrap_or_default()),
            endpoint: value(GIT_URL).unwrap_or_default(),
            allowed_branches: value(ALLOWED_BRANCHES).unwrap_or_default(),
            host: parse_setting(BIND_ADDRESS, value(BIND_ADDRESS), defaults.host)?,
            port: parse_setting(PORT, value(PORT), defaults.port)?,
            webhook_path,
            max_body_bytes,
            log_format: parse_setting(LOG_FORMAT, value(LOG_FORMAT), defaults.log_format)?,
        })
    }
}

fn parse_setting<T>(key: &str, raw: Option<String>, default: T) -> ConfigurationResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| invalid(key, format!("'{}' is not valid: {}", raw, e))),
        None => Ok(default),
    }
}

fn validate_webhook_path(path: &str) -> ConfigurationResult<()> {
    if !path.starts_with('/') {
        return Err(invalid(WEBHOOK_PATH, format!("'{}' must start with '/'", path)));
    }
    if path == HEALTH_PATH {
        return Err(invalid(
            WEBHOOK_PATH,
            format!("'{}' is reserved for the health check", path),
        ));
    }
    Ok(())
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidSetting {
        key: key.to_string(),
        reason: reason.into(),
    }
}
