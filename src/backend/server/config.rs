/**
 * Server Configuration
 *
 * Sources, later overriding earlier:
 *
 * 1. Built-in defaults (in-memory storage, log push provider)
 * 2. TOML file named by `SPLITSYNC_CONFIG`, if set
 * 3. Environment variables (`.env` is loaded by the binary through dotenv)
 *
 * | Field               | Environment        |
 * |---------------------|--------------------|
 * | `bind_addr`         | `SERVER_ADDR`      |
 * | `storage`           | `STORAGE_BACKEND`  |
 * | `database_url`      | `DATABASE_URL`     |
 * | `jwt_secret`        | `JWT_SECRET`       |
 * | `token_ttl_days`    | `TOKEN_TTL_DAYS`   |
 * | `push_provider`     | `PUSH_PROVIDER`    |
 * | `push_gateway_url`  | `PUSH_GATEWAY_URL` |
 *
 * Unlike the optional services of a development server, a bad configuration
 * is fatal: `validate` runs before anything is built.
 */
use serde::Deserialize;
use std::net::SocketAddr;
use thiserror::Error;

pub const CONFIG_FILE_ENV: &str = "SPLITSYNC_CONFIG";

pub const STORAGE_BACKENDS: [&str; 2] = ["postgres", "memory"];
pub const PUSH_PROVIDERS: [&str; 3] = ["log", "http", "none"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// `"postgres"` or `"memory"`
    pub storage: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_days: u64,
    /// bcrypt work factor for stored passwords
    pub bcrypt_cost: u32,
    /// `"log"`, `"http"` or `"none"`
    pub push_provider: String,
    pub push_gateway_url: Option<String>,
    /// Buffered events per realtime subscriber before it lags
    pub realtime_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            storage: "memory".to_string(),
            database_url: None,
            jwt_secret: String::new(),
            token_ttl_days: 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            push_provider: "log".to_string(),
            push_gateway_url: None,
            realtime_capacity: 1000,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment and the optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => {
                tracing::info!("[Config] Reading {}", path);
                Some(std::fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })?)
            }
            Err(_) => None,
        };

        let config = Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Layer a TOML document and an environment lookup over the defaults
    pub fn from_sources(
        toml_source: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match toml_source {
            Some(source) => toml::from_str::<ServerConfig>(source)?,
            None => ServerConfig::default(),
        };

        if let Some(addr) = env("SERVER_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|_| ConfigError::invalid("bind_addr", format!("'{}' is not host:port", addr)))?;
        }
        if let Some(storage) = env("STORAGE_BACKEND") {
            config.storage = storage;
        }
        if let Some(url) = env("DATABASE_URL") {
            config.database_url = Some(url);
        }
        if let Some(secret) = env("JWT_SECRET") {
            config.jwt_secret = secret;
        }
        if let Some(days) = env("TOKEN_TTL_DAYS") {
            config.token_ttl_days = days
                .parse()
                .map_err(|_| ConfigError::invalid("token_ttl_days", format!("'{}' is not a number", days)))?;
        }
        if let Some(provider) = env("PUSH_PROVIDER") {
            config.push_provider = provider;
        }
        if let Some(url) = env("PUSH_GATEWAY_URL") {
            config.push_gateway_url = Some(url);
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !STORAGE_BACKENDS.contains(&self.storage.as_str()) {
            return Err(ConfigError::invalid(
                "storage",
                format!("unknown backend '{}', expected one of {:?}", self.storage, STORAGE_BACKENDS),
            ));
        }
        if self.storage == "postgres" && self.database_url.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::invalid("database_url", "required when storage = \"postgres\""));
        }
        if !PUSH_PROVIDERS.contains(&self.push_provider.as_str()) {
            return Err(ConfigError::invalid(
                "push_provider",
                format!("unknown provider '{}', expected one of {:?}", self.push_provider, PUSH_PROVIDERS),
            ));
        }
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::invalid("jwt_secret", "must not be empty"));
        }
        if self.token_ttl_days == 0 {
            return Err(ConfigError::invalid("token_ttl_days", "must be at least 1"));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::invalid("bcrypt_cost", "must be between 4 and 31"));
        }
        if self.realtime_capacity == 0 {
            return Err(ConfigError::invalid("realtime_capacity", "must be at least 1"));
        }
        Ok(())
    }
}
