use std::time::Duration;

use chrono_tz::Tz;
use staffboard_core::config::PresenceConfig;
use staffboard_core::timezone::parse_timezone;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Operator configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub presence: PresenceConfig,
}

impl CliConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                   | Default               |
    /// |---------------------------|-----------------------|
    /// | `DATABASE_URL`            | required              |
    /// | `STAFFBOARD_TIMEZONE`     | `America/Los_Angeles` |
    /// | `REGISTRY_CACHE_TTL_SECS` | `30`                  |
    /// | `DB_MAX_CONNECTIONS`      | `10`                  |
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

        let timezone: Tz = match lookup("STAFFBOARD_TIMEZONE") {
            Some(name) => parse_timezone(name.trim()).map_err(|e| ConfigError::Invalid {
                name: "STAFFBOARD_TIMEZONE",
                reason: e.to_string(),
            })?,
            None => PresenceConfig::default().timezone,
        };

        let ttl_secs: u64 = parse_or("REGISTRY_CACHE_TTL_SECS", lookup("REGISTRY_CACHE_TTL_SECS"), 30)?;
        let max_connections: u32 = parse_or("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"), 10)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "DB_MAX_CONNECTIONS",
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            database_url,
            max_connections,
            presence: PresenceConfig {
                timezone,
                registry_ttl: Duration::from_secs(ttl_secs),
            },
        })
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}
