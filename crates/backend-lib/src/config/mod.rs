// ============================
// crates/backend-lib/src/config/mod.rs
// ============================
//! Configuration management.
//!
//! Sources, lowest to highest precedence: compiled defaults, a TOML file,
//! `USERGATE_*` environment variables (`__` separates nested keys), and the
//! bare `JWT_SECRET` / `DATABASE_URL` variables.
use crate::auth::HashCost;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "USERGATE_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration errors. Any of these aborts startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("token signing secret is not set (JWT_SECRET)")]
    MissingSecret,

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level (overridden by RUST_LOG)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
    pub auth: AuthSettings,
    pub rate_limit: RateLimitSettings,
    pub storage: StorageSettings,
}

/// Token and credential settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC key for bearer tokens
    pub jwt_secret: String,
    /// Token lifetime in seconds
    pub token_ttl_secs: u64,
    /// scrypt cost for new credentials
    pub hash: HashCost,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("hash", &self.hash)
            .finish()
    }
}

/// Fixed-window rate limit settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Steady request budget per window
    pub rate: u32,
    /// Extra requests tolerated before rejecting
    pub burst: u32,
    /// Window length in seconds
    pub window_secs: u64,
    /// How often expired windows are swept
    pub cleanup_interval_secs: u64,
}

/// Which directory implementation to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Directory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    /// Upper bound on protected read queries
    pub query_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            log_level: "info".to_string(),
            log_json: false,
            auth: AuthSettings::default(),
            rate_limit: RateLimitSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 5 * 60,
            hash: HashCost::default(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            rate: 10,
            burst: 5,
            window_secs: 60,
            cleanup_interval_secs: 60 * 60,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            database_url: "postgres://postgres@localhost:5432/users".to_string(),
            max_connections: 100,
            min_connections: 10,
            idle_timeout_secs: 5 * 60,
            max_lifetime_secs: 60 * 60,
            query_timeout_secs: 5,
        }
    }
}

impl StorageSettings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl Settings {
    /// Load from `config.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from the given TOML file (if it exists) and the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings: Settings = Self::figment(path.as_ref())
            .extract()
            .map_err(Box::new)?;
        settings.validate()?;
        Ok(settings)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Env::raw().only(&["JWT_SECRET"]).map(|_| "auth.jwt_secret".into()))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "storage.database_url".into()))
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(invalid("log_level", format!("unknown level `{}`", self.log_level)));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(invalid("auth.token_ttl_secs", "must be positive"));
        }
        self.auth
            .hash
            .params()
            .map_err(|e| invalid("auth.hash", e.to_string()))?;
        if self.rate_limit.window_secs == 0 {
            return Err(invalid("rate_limit.window_secs", "must be positive"));
        }
        if self.rate_limit.rate.saturating_add(self.rate_limit.burst) == 0 {
            return Err(invalid("rate_limit.rate", "rate + burst must be positive"));
        }
        if self.storage.query_timeout_secs == 0 {
            return Err(invalid("storage.query_timeout_secs", "must be positive"));
        }
        if self.storage.backend == StorageBackend::Postgres {
            if self.storage.database_url.is_empty() {
                return Err(invalid("storage.database_url", "must be set for postgres"));
            }
            if self.storage.min_connections > self.storage.max_connections {
                return Err(invalid(
                    "storage.min_connections",
                    "cannot exceed max_connections",
                ));
            }
        }
        Ok(())
    }
}
