use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

/// Where records are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Storage {
    MySql(String),
    /// Volatile; only with `HRMS_IN_MEMORY=1`
    Memory,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub storage: Storage,
    pub db_max_connections: u32,

    // Rate limiting, 0 disables
    pub rate_api_per_min: u32,

    pub api_prefix: String,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            storage: Storage::Memory,
            db_max_connections: 10,
            rate_api_per_min: 1000,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or(defaults.server_addr),
            storage: storage(env::var("DATABASE_URL").ok(), flag("HRMS_IN_MEMORY"))?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            rate_api_per_min: parse_or("RATE_API_PER_MIN", defaults.rate_api_per_min)?,
            api_prefix: env::var("API_PREFIX").unwrap_or(defaults.api_prefix),
            log_dir: env::var("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: parse_or("LOG_LEVEL", defaults.log_level)?,
        })
    }
}

/// A database URL wins; without one the volatile store must be asked for.
fn storage(database_url: Option<String>, in_memory: bool) -> Result<Storage> {
    match database_url.filter(|url| !url.trim().is_empty()) {
        Some(url) => Ok(Storage::MySql(url)),
        None if in_memory => Ok(Storage::Memory),
        None => bail!("DATABASE_URL is not set (set HRMS_IN_MEMORY=1 to run without persistence)"),
    }
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Parse `key` from the environment, falling back to `default` when unset.
fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_when_unset() {
        let value: u32 = parse_or("HRMS_TEST_SURELY_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn defaults_point_at_local_api() {
        let config = Config::default();
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.storage, Storage::Memory);
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn missing_database_url_refuses_to_start() {
        let err = storage(None, false).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
        assert!(storage(Some("  ".into()), false).is_err());
    }

    #[test]
    fn in_memory_needs_explicit_opt_in() {
        assert_eq!(storage(None, true).unwrap(), Storage::Memory);
        assert_eq!(
            storage(Some("mysql://localhost/hrms".into()), true).unwrap(),
            Storage::MySql("mysql://localhost/hrms".into())
        );
    }
}
