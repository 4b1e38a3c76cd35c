//! Configuration management for ClubHub
//!
//! Defaults, then an optional TOML file, then environment variables.
//! Environment variables follow `CLUBHUB_<SECTION>_<KEY>`; the conventional
//! `DATABASE_URL`, `JWT_SECRET` and `PORT` are honoured as well.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::logging::LogLevel;

mod error;

pub use error::ConfigError;

/// Secret used when none is configured. `validate` refuses it unless
/// `auth.allow_insecure_secret` is set, which only tests and local runs do.
pub const DEVELOPMENT_TOKEN_SECRET: &str = "clubhub-development-secret";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// How long in-flight requests get to finish after a shutdown signal
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,

    /// Answer CORS preflights for any origin (browser front-ends on another port)
    pub cors_allow_any_origin: bool,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite path, `sqlite://<path>` URL, or `:memory:`
    pub database_url: String,

    /// Maximum pooled connections
    pub pool_size: u32,

    /// How long a writer waits on a locked database
    #[serde(with = "humantime_serde")]
    pub busy_timeout: Duration,
}

/// Credential configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret the session-token MAC key is derived from
    pub token_secret: String,

    /// Lifetime of an issued session token
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,

    /// Accounts registered with these emails become administrators
    pub admin_emails: Vec<String>,

    /// Only administrators and privileged users may create clubs
    pub restrict_club_creation: bool,

    /// Permit the built-in development secret
    pub allow_insecure_secret: bool,

    /// Argon2 memory cost in KiB
    pub password_memory_kib: u32,

    /// Argon2 iteration count
    pub password_iterations: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 5500)),
            shutdown_timeout: Duration::from_secs(30),
            cors_allow_any_origin: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "clubhub.db".to_string(),
            pool_size: 8,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: DEVELOPMENT_TOKEN_SECRET.to_string(),
            token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            admin_emails: Vec::new(),
            restrict_club_creation: false,
            allow_insecure_secret: false,
            password_memory_kib: 19 * 1024,
            password_iterations: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_duration_var(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    humantime_serde::re::humantime::parse_duration(raw.trim()).map_err(|e| {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }
    })
}

impl Config {
    /// Load configuration from defaults overlaid with environment variables.
    ///
    /// The result is not validated; apply any command-line overrides first,
    /// then call [`Config::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_with(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then overlay environment variables.
    /// Like [`Config::from_env`], this leaves validation to the caller.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
                path: path.as_ref().to_path_buf(),
                source,
            })?;

        let mut config: Self = toml::from_str(&contents)?;

        config.apply_env_with(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values from a variable lookup (the process environment in production)
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(addr) = lookup("CLUBHUB_SERVER_BIND_ADDRESS") {
            self.server.bind_address = parse_var("CLUBHUB_SERVER_BIND_ADDRESS", &addr)?;
        }
        if let Some(port) = lookup("PORT") {
            let port: u16 = parse_var("PORT", &port)?;
            self.server.bind_address.set_port(port);
        }
        if let Some(timeout) = lookup("CLUBHUB_SERVER_SHUTDOWN_TIMEOUT") {
            self.server.shutdown_timeout =
                parse_duration_var("CLUBHUB_SERVER_SHUTDOWN_TIMEOUT", &timeout)?;
        }
        if let Some(cors) = lookup("CLUBHUB_SERVER_CORS_ALLOW_ANY_ORIGIN") {
            self.server.cors_allow_any_origin =
                parse_var("CLUBHUB_SERVER_CORS_ALLOW_ANY_ORIGIN", &cors)?;
        }

        // Store
        if let Some(url) = lookup("CLUBHUB_STORE_DATABASE_URL").or_else(|| lookup("DATABASE_URL"))
        {
            self.store.database_url = url;
        }
        if let Some(size) = lookup("CLUBHUB_STORE_POOL_SIZE") {
            self.store.pool_size = parse_var("CLUBHUB_STORE_POOL_SIZE", &size)?;
        }
        if let Some(timeout) = lookup("CLUBHUB_STORE_BUSY_TIMEOUT") {
            self.store.busy_timeout = parse_duration_var("CLUBHUB_STORE_BUSY_TIMEOUT", &timeout)?;
        }

        // Auth
        if let Some(secret) = lookup("CLUBHUB_AUTH_TOKEN_SECRET").or_else(|| lookup("JWT_SECRET"))
        {
            self.auth.token_secret = secret;
        }
        if let Some(ttl) = lookup("CLUBHUB_AUTH_TOKEN_TTL") {
            self.auth.token_ttl = parse_duration_var("CLUBHUB_AUTH_TOKEN_TTL", &ttl)?;
        }
        if let Some(emails) = lookup("CLUBHUB_AUTH_ADMIN_EMAILS") {
            self.auth.admin_emails = emails
                .split(',')
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
        }
        if let Some(restrict) = lookup("CLUBHUB_AUTH_RESTRICT_CLUB_CREATION") {
            self.auth.restrict_club_creation =
                parse_var("CLUBHUB_AUTH_RESTRICT_CLUB_CREATION", &restrict)?;
        }
        if let Some(memory) = lookup("CLUBHUB_AUTH_PASSWORD_MEMORY_KIB") {
            self.auth.password_memory_kib =
                parse_var("CLUBHUB_AUTH_PASSWORD_MEMORY_KIB", &memory)?;
        }
        if let Some(iterations) = lookup("CLUBHUB_AUTH_PASSWORD_ITERATIONS") {
            self.auth.password_iterations =
                parse_var("CLUBHUB_AUTH_PASSWORD_ITERATIONS", &iterations)?;
        }
        if let Some(allow) = lookup("CLUBHUB_AUTH_ALLOW_INSECURE_SECRET") {
            self.auth.allow_insecure_secret =
                parse_var("CLUBHUB_AUTH_ALLOW_INSECURE_SECRET", &allow)?;
        }

        // Logging
        if let Some(level) = lookup("CLUBHUB_LOG_LEVEL") {
            self.logging.level = level.trim().to_lowercase();
        }
        if let Some(json) = lookup("CLUBHUB_LOG_JSON") {
            self.logging.json_format = parse_var("CLUBHUB_LOG_JSON", &json)?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.database_url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "store.database_url must not be empty".to_string(),
            ));
        }

        if self.store.pool_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "store.pool_size must be greater than 0".to_string(),
            ));
        }

        if self.auth.token_secret.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "auth.token_secret must not be empty".to_string(),
            ));
        }

        if self.auth.token_secret == DEVELOPMENT_TOKEN_SECRET && !self.auth.allow_insecure_secret {
            return Err(ConfigError::ValidationFailed(
                "auth.token_secret is the development default; set JWT_SECRET or \
                 CLUBHUB_AUTH_TOKEN_SECRET"
                    .to_string(),
            ));
        }

        if self.auth.token_ttl.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "auth.token_ttl must be greater than 0".to_string(),
            ));
        }

        // argon2 rejects memory below 8 KiB per lane
        if self.auth.password_memory_kib < 8 || self.auth.password_iterations == 0 {
            return Err(ConfigError::ValidationFailed(
                "auth.password_memory_kib must be at least 8 and auth.password_iterations at least 1"
                    .to_string(),
            ));
        }

        if let Err(e) = self.logging.level.parse::<LogLevel>() {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: e.to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        std::fs::write(path.as_ref(), contents).map_err(|source| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source,
        })?;

        Ok(())
    }

    /// Configuration for tests and local experiments: in-memory store, dev secret
    pub fn for_testing() -> Self {
        let mut config = Self::default();
        config.store.database_url = ":memory:".to_string();
        config.store.pool_size = 1;
        config.auth.allow_insecure_secret = true;
        config.auth.password_memory_kib = 8;
        config.auth.password_iterations = 1;
        config
    }
}
