use crate::utils::get_env_with_prefix;
use serde::{Deserialize, Serialize};

/// Session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Session TTL (in seconds), counted from login
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Cookie name checked when a request has no bearer token
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            cookie_name: default_cookie_name(),
        }
    }
}

impl SessionConfig {
    /// Load session configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ttl) = get_env_with_prefix("SESSION_TTL_SECONDS") {
            if let Ok(seconds) = ttl.parse() {
                config.ttl_seconds = seconds;
            } else {
                tracing::warn!(value = %ttl, "Ignoring invalid SESSION_TTL_SECONDS");
            }
        }

        if let Some(name) = get_env_with_prefix("SESSION_COOKIE_NAME") {
            config.cookie_name = name;
        }

        config
    }

    /// Session TTL as a chrono duration
    pub fn ttl(&self) -> chrono::Duration {
        let seconds = i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX);
        chrono::Duration::seconds(seconds.min(MAX_TTL_SECONDS))
    }
}

/// Upper bound on session lifetime (one year).
pub(crate) const MAX_TTL_SECONDS: i64 = 365 * 24 * 3600;

fn default_ttl_seconds() -> u64 {
    3600 * 12 // 12 hours
}

fn default_cookie_name() -> String {
    "staffgate_session".to_string()
}
