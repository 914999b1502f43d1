//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use domain::ServiceSettings;

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL URL; unset runs on in-memory stores
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `TRANSACTION_TIMEOUT_MS`: per-operation window (default: `5000`)
/// - `COMPENSATION_MAX_ATTEMPTS`: release retries (default: `3`)
/// - `COMPENSATION_BACKOFF_MS`: base release backoff (default: `50`)
/// - `TOGGLE_MAX_ATTEMPTS`: optimistic reaction commits (default: `8`)
/// - `SEED_FILE`: optional JSON file with targets and identities to load
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub transaction_timeout_ms: u64,
    pub compensation_max_attempts: u32,
    pub compensation_backoff_ms: u64,
    pub toggle_max_attempts: u32,
    pub seed_file: Option<PathBuf>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: std::env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            database_max_connections: env_or(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            transaction_timeout_ms: env_or(
                "TRANSACTION_TIMEOUT_MS",
                defaults.transaction_timeout_ms,
            ),
            compensation_max_attempts: env_or(
                "COMPENSATION_MAX_ATTEMPTS",
                defaults.compensation_max_attempts,
            ),
            compensation_backoff_ms: env_or(
                "COMPENSATION_BACKOFF_MS",
                defaults.compensation_backoff_ms,
            ),
            toggle_max_attempts: env_or("TOGGLE_MAX_ATTEMPTS", defaults.toggle_max_attempts),
            seed_file: std::env::var("SEED_FILE").ok().map(PathBuf::from),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings handed to the domain services.
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            transaction_timeout: Duration::from_millis(self.transaction_timeout_ms),
            compensation_max_attempts: self.compensation_max_attempts,
            compensation_backoff: Duration::from_millis(self.compensation_backoff_ms),
            toggle_max_attempts: self.toggle_max_attempts,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 10,
            transaction_timeout_ms: 5000,
            compensation_max_attempts: 3,
            compensation_backoff_ms: 50,
            toggle_max_attempts: 8,
            seed_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_service_settings_match_defaults() {
        assert_eq!(
            Config::default().service_settings(),
            ServiceSettings::default()
        );
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
    }
}
