use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::access::{AccessConfig, AccessTables};
use crate::error::{Result, StaffgateError};
use crate::impersonation::ImpersonationConfig;
use crate::session::SessionConfig;
use crate::utils::get_env_with_prefix;

/// Main configuration for a staffgate service
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub impersonation: ImpersonationConfig,
    /// JSON file with the role table and page registry. The built-in tables
    /// are used when unset.
    #[serde(default)]
    pub access_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

impl ServerConfig {
    pub fn addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl Config {
    /// Load the access tables this configuration points at.
    ///
    /// # Errors
    ///
    /// Returns [`StaffgateError::Config`] when the access file cannot be
    /// read or does not describe valid tables.
    pub fn load_access(&self) -> Result<AccessTables> {
        match &self.access_file {
            Some(path) => AccessConfig::from_file(path)?.build(),
            None => {
                tracing::info!(
                    target: "staffgate.access.loaded",
                    "No access file configured; using built-in tables"
                );
                Ok(AccessTables::standard())
            }
        }
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    pub fn with_impersonation(mut self, impersonation: ImpersonationConfig) -> Self {
        self.config.impersonation = impersonation;
        self
    }

    pub fn with_access_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.access_file = Some(path.into());
        self
    }

    /// Load configuration from environment variables with STAFFGATE_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        // Check STAFFGATE_PORT first, fall back to PORT
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }
        if let Some(path) = get_env_with_prefix("ACCESS_FILE") {
            self.config.access_file = Some(PathBuf::from(path));
        }

        self.config.session = SessionConfig::from_env();
        self.config.impersonation = ImpersonationConfig::from_env();

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns [`StaffgateError::Config`] if any setting is invalid:
    /// - Invalid server address (host:port) or port 0
    /// - Invalid log level
    /// - Session TTL of zero or longer than a year
    /// - Impersonation max duration of zero
    pub fn build(self) -> Result<Config> {
        self.config.server.addr().map_err(|e| {
            StaffgateError::config(format!(
                "Invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        if self.config.server.port == 0 {
            return Err(StaffgateError::config("Server port must be greater than 0"));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(StaffgateError::config(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let ttl = self.config.session.ttl_seconds;
        if ttl == 0 || ttl > crate::session::MAX_TTL_SECONDS as u64 {
            return Err(StaffgateError::config(format!(
                "Session TTL must be between 1 and {} seconds, got {}",
                crate::session::MAX_TTL_SECONDS,
                ttl
            )));
        }

        if self.config.impersonation.max_duration_seconds == 0 {
            return Err(StaffgateError::config(
                "Impersonation max duration must be greater than 0",
            ));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
