//! Client configuration
//!
//! Configuration is loaded from environment variables. Every variable is optional;
//! values that fail to parse leave the default in place.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the task/auth REST API
    pub api_url: String,
    /// Location of the persistent key-value store
    pub store_path: PathBuf,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Error notification configuration
    pub errors: ErrorConfig,
}

/// Authentication-related configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Path of the login endpoint, relative to `api_url`
    pub login_path: String,
    /// Store key holding the bearer token
    pub token_key: String,
    /// Period between token expiry checks while authenticated
    pub revalidate_interval: Duration,
    /// Timeout applied to auth requests
    pub request_timeout: Duration,
}

/// Error notification configuration
#[derive(Debug, Clone)]
pub struct ErrorConfig {
    /// Delay after which non-critical notifications are dismissed
    pub auto_dismiss_after: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001".to_string(),
            store_path: PathBuf::from(".taskboard/store.json"),
            auth: AuthConfig::default(),
            errors: ErrorConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            token_key: "auth_token".to_string(),
            revalidate_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            auto_dismiss_after: Duration::from_millis(5000),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("TASKBOARD_API_URL")
            && !url.is_empty()
        {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(path) = env::var("TASKBOARD_STORE_PATH")
            && !path.is_empty()
        {
            config.store_path = PathBuf::from(path);
        }

        // Auth config
        if let Ok(path) = env::var("TASKBOARD_LOGIN_PATH")
            && !path.is_empty()
        {
            config.auth.login_path = path;
        }
        if let Ok(key) = env::var("TASKBOARD_TOKEN_KEY")
            && !key.is_empty()
        {
            config.auth.token_key = key;
        }
        if let Ok(val) = env::var("TASKBOARD_REVALIDATE_SECS")
            && let Ok(secs) = val.parse::<u64>()
            && secs > 0
        {
            config.auth.revalidate_interval = Duration::from_secs(secs);
        }
        if let Ok(val) = env::var("TASKBOARD_REQUEST_TIMEOUT_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.auth.request_timeout = Duration::from_secs(secs);
        }

        // Error config
        if let Ok(val) = env::var("TASKBOARD_ERROR_TTL_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.errors.auto_dismiss_after = Duration::from_millis(ms);
        }

        config
    }

    /// Absolute URL of the login endpoint
    pub fn login_url(&self) -> String {
        format!("{}{}", self.api_url, self.auth.login_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:3001");
        assert_eq!(config.auth.token_key, "auth_token");
        assert_eq!(config.auth.revalidate_interval, Duration::from_secs(30));
        assert_eq!(
            config.errors.auto_dismiss_after,
            Duration::from_millis(5000)
        );
    }

    #[test]
    fn test_login_url_joins_base_and_path() {
        let config = Config::default();
        assert_eq!(config.login_url(), "http://localhost:3001/login");
    }

    #[test]
    fn test_config_from_env() {
        // No TASKBOARD_* variables are set in the test environment
        let config = Config::from_env();
        assert_eq!(config.auth.login_path, "/login");
    }
}
