//! Configuration module for Ovoo.

use serde::Deserialize;
use std::path::Path;

use crate::milter::DEFAULT_LISTEN_ADDR;
use crate::{OvooError, Result};

/// Relay configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RelayConfig {
    /// Mail domain aliases and reply aliases are minted in.
    #[serde(default)]
    pub domain: String,
    /// Optional newline-separated word list replacing the built-in one.
    #[serde(default)]
    pub dictionary_path: Option<String>,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/ovoo.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Mail-filter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MilterConfig {
    /// Address the milter endpoint listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Login of the account chains are created as.
    #[serde(default = "default_milter_login")]
    pub login: String,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_milter_login() -> String {
    "milter".to_string()
}

impl Default for MilterConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            login: default_milter_login(),
        }
    }
}

/// Bootstrap administrator created on first start.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_login")]
    pub login: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Initial password. The administrator is not created while empty.
    #[serde(default)]
    pub password: String,
}

fn default_admin_login() -> String {
    "admin".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            login: default_admin_login(),
            first_name: String::new(),
            last_name: String::new(),
            password: String::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file written next to stdout.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub milter: MilterConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(OvooError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| OvooError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `OVOO_DOMAIN`: relay domain
    /// - `OVOO_ADMIN_PASSWORD`: bootstrap administrator password
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(domain) = std::env::var("OVOO_DOMAIN") {
            if !domain.is_empty() {
                self.relay.domain = domain;
            }
        }
        if let Ok(password) = std::env::var("OVOO_ADMIN_PASSWORD") {
            if !password.is_empty() {
                self.admin.password = password;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.relay.domain.trim().len() < 2 {
            return Err(OvooError::Config(
                "relay domain is not set. \
                 Set it in config.toml or via OVOO_DOMAIN environment variable."
                    .to_string(),
            ));
        }
        if self.milter.login.trim().is_empty() {
            return Err(OvooError::Config("milter login can not be empty".to_string()));
        }
        Ok(())
    }
}
