//! Application configuration from environment variables.
//!
//! Load configuration using `Config::from_env()` after calling `dotenvy::dotenv()`
//! (and `dotenvy::from_path` when `CONFIG_PATH` names an env file).
//! Durations use humantime syntax (`15m`, `720h`, `10s`).

use std::time::Duration;

use derive_more::Display;

use crate::core::auth::jwt::JwtConfig;
use crate::core::db::pool::{DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS, DbConfig};

/// Run mode; selects the log format and level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Default)]
pub enum Mode {
    #[display("local")]
    Local,
    #[default]
    #[display("development")]
    Development,
    #[display("production")]
    Production,
    #[display("undefined")]
    Undefined,
}

impl Mode {
    /// Parse a mode name; unknown names yield `Undefined`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "local" => Mode::Local,
            "development" => Mode::Development,
            "production" => Mode::Production,
            _ => Mode::Undefined,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("{key} has an invalid duration '{value}': {source}")]
    InvalidDuration {
        key: &'static str,
        value: String,
        source: humantime::DurationError,
    },

    #[error("{key} has an invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// JWT settings
#[derive(Clone)]
pub struct JwtSettings {
    pub signing_key: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("signing_key", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl HttpSettings {
    /// `host:port` to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whole-request timeout applied to every route
    pub fn request_timeout(&self) -> Duration {
        self.read_timeout.max(self.write_timeout)
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    pub mode: Mode,
    pub password_pepper: String,
    pub jwt: JwtSettings,
    pub http: HttpSettings,
    /// PostgreSQL pool settings; the in-memory store is used when unset
    pub database: Option<DbConfig>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("mode", &self.mode)
            .field("password_pepper", &"[REDACTED]")
            .field("jwt", &self.jwt)
            .field("http", &self.http)
            .field("database", &self.has_database())
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let duration = |key: &'static str, default: &str| -> Result<Duration, ConfigError> {
            let value = get(key).unwrap_or_else(|| default.to_string());
            humantime::parse_duration(value.trim()).map_err(|source| {
                ConfigError::InvalidDuration {
                    key,
                    value: value.clone(),
                    source,
                }
            })
        };

        let port = match get("HTTP_PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "HTTP_PORT",
                    value,
                })?,
            None => 80,
        };

        let database = match get("DATABASE_URL") {
            Some(url) => {
                let max_connections = match get("DB_MAX_CONNECTIONS") {
                    Some(value) => value
                        .trim()
                        .parse::<u32>()
                        .ok()
                        .filter(|max| *max > 0)
                        .ok_or(ConfigError::InvalidValue {
                            key: "DB_MAX_CONNECTIONS",
                            value,
                        })?,
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                let default_acquire =
                    humantime::format_duration(DEFAULT_ACQUIRE_TIMEOUT).to_string();

                Some(DbConfig {
                    database_url: url,
                    max_connections,
                    acquire_timeout: duration("DB_ACQUIRE_TIMEOUT", &default_acquire)?,
                })
            }
            None => None,
        };

        Ok(Self {
            mode: get("DEBUG_MODE")
                .map(|value| Mode::parse(&value))
                .unwrap_or_default(),
            password_pepper: required("PASSWORD_PEPPER")?,
            jwt: JwtSettings {
                signing_key: required("JWT_SIGNING_KEY")?,
                access_ttl: duration("JWT_ACCESS_TOKEN_TTL", "15m")?,
                refresh_ttl: duration("JWT_REFRESH_TOKEN_TTL", "720h")?,
            },
            http: HttpSettings {
                host: get("HTTP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                read_timeout: duration("HTTP_READ_TIMEOUT", "10s")?,
                write_timeout: duration("HTTP_WRITE_TIMEOUT", "10s")?,
            },
            database,
        })
    }

    /// Check if database is configured
    pub fn has_database(&self) -> bool {
        self.database.is_some()
    }

    /// Token settings in the form the JWT service takes
    pub fn jwt_config(&self) -> Result<JwtConfig, ConfigError> {
        let convert = |key: &'static str, value: Duration| {
            chrono::Duration::from_std(value).map_err(|_| ConfigError::InvalidValue {
                key,
                value: humantime::format_duration(value).to_string(),
            })
        };

        Ok(JwtConfig::new(self.jwt.signing_key.clone())
            .access_ttl(convert("JWT_ACCESS_TOKEN_TTL", self.jwt.access_ttl)?)
            .refresh_ttl(convert("JWT_REFRESH_TOKEN_TTL", self.jwt.refresh_ttl)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // ========================================================================
    // Lookup-based tests (no env var dependencies - thread safe)
    // ========================================================================

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("PASSWORD_PEPPER", "pepper"),
        ("JWT_SIGNING_KEY", "signing-key"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.mode, Mode::Development);
        assert_eq!(config.jwt.access_ttl, Duration::from_secs(15 * 60));
        assert_eq!(config.jwt.refresh_ttl, Duration::from_secs(720 * 3600));
        assert_eq!(config.http.addr(), "0.0.0.0:80");
        assert_eq!(config.http.request_timeout(), Duration::from_secs(10));
        assert!(!config.has_database());
    }

    #[test]
    fn test_missing_pepper() {
        let result = load(&[("JWT_SIGNING_KEY", "k")]);
        assert!(matches!(result, Err(ConfigError::Missing("PASSWORD_PEPPER"))));
    }

    #[test]
    fn test_missing_signing_key() {
        let result = load(&[("PASSWORD_PEPPER", "p")]);
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SIGNING_KEY"))));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("DEBUG_MODE", " Production "),
            ("JWT_ACCESS_TOKEN_TTL", "5m"),
            ("HTTP_HOST", "127.0.0.1"),
            ("HTTP_PORT", "8080"),
            ("HTTP_WRITE_TIMEOUT", "30s"),
            ("DATABASE_URL", "postgres://localhost/taskkeep"),
        ]);
        let config = load(&pairs).unwrap();

        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.jwt.access_ttl, Duration::from_secs(300));
        assert_eq!(config.http.addr(), "127.0.0.1:8080");
        assert_eq!(config.http.request_timeout(), Duration::from_secs(30));

        let database = config.database.unwrap();
        assert_eq!(database.database_url, "postgres://localhost/taskkeep");
        assert_eq!(database.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(database.acquire_timeout, DEFAULT_ACQUIRE_TIMEOUT);
    }

    #[test]
    fn test_pool_settings() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("DATABASE_URL", "postgres://localhost/taskkeep"),
            ("DB_MAX_CONNECTIONS", "25"),
            ("DB_ACQUIRE_TIMEOUT", "5s"),
        ]);
        let database = load(&pairs).unwrap().database.unwrap();

        assert_eq!(database.max_connections, 25);
        assert_eq!(database.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_pool_settings_ignored_without_url() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DB_MAX_CONNECTIONS", "25"));

        assert!(load(&pairs).unwrap().database.is_none());
    }

    #[test]
    fn test_invalid_pool_size() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("DATABASE_URL", "postgres://localhost/taskkeep"),
            ("DB_MAX_CONNECTIONS", "0"),
        ]);

        assert!(matches!(
            load(&pairs),
            Err(ConfigError::InvalidValue { key: "DB_MAX_CONNECTIONS", .. })
        ));
    }

    #[test]
    fn test_invalid_duration() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("JWT_REFRESH_TOKEN_TTL", "forever"));

        let err = load(&pairs).unwrap_err();
        assert!(err.to_string().contains("JWT_REFRESH_TOKEN_TTL"));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("HTTP_PORT", "eighty"));

        assert!(matches!(
            load(&pairs),
            Err(ConfigError::InvalidValue { key: "HTTP_PORT", .. })
        ));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("local"), Mode::Local);
        assert_eq!(Mode::parse("DEVELOPMENT"), Mode::Development);
        assert_eq!(Mode::parse("production"), Mode::Production);
        assert_eq!(Mode::parse("staging"), Mode::Undefined);
        assert_eq!(Mode::Undefined.to_string(), "undefined");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&REQUIRED).unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("signing-key"));
        assert!(!debug.contains("\"pepper\""));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_jwt_config_conversion() {
        let config = load(&REQUIRED).unwrap();
        let jwt = config.jwt_config().unwrap();

        assert_eq!(jwt.access_ttl, chrono::Duration::minutes(15));
        assert_eq!(jwt.refresh_ttl, chrono::Duration::hours(720));
    }
}
