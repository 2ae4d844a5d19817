//! SwiftStorage Configuration
//!
//! This module provides the configuration structures for the storage
//! client: where to authenticate, which container to work in, and how
//! long to wait on each endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Main SwiftStorage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwiftStorageConfig {
    /// Auth server configuration
    pub auth: AuthConfig,

    /// Storage endpoint configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Auth server configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Auth server URL
    pub url: String,

    /// Auth server username (sent as X-Auth-User)
    pub username: String,

    /// Auth server password (sent as X-Auth-Key)
    pub password: String,

    /// Auth timeout in seconds
    #[serde(default = "default_auth_timeout")]
    pub timeout_secs: u64,
}

/// Storage endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Container all object paths are relative to (empty = account root)
    #[serde(default)]
    pub container: String,

    /// Storage communication timeout in seconds
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_auth_timeout() -> u64 {
    5
}

fn default_storage_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            container: String::new(),
            timeout_secs: default_storage_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SwiftStorageConfig {
    /// Build a configuration with default timeouts and no container
    pub fn new(
        auth_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            auth: AuthConfig {
                url: auth_url.into(),
                username: username.into(),
                password: password.into(),
                timeout_secs: default_auth_timeout(),
            },
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Set the container name
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.storage.container = container.into();
        self
    }

    /// Set both endpoint timeouts, rounding sub-second parts up to whole seconds
    pub fn with_timeouts(mut self, auth: Duration, storage: Duration) -> Self {
        self.auth.timeout_secs = ceil_secs(auth);
        self.storage.timeout_secs = ceil_secs(storage);
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: SwiftStorageConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.auth.url.is_empty() {
            return Err(crate::Error::Config("auth.url cannot be empty".into()));
        }

        match reqwest::Url::parse(&self.auth.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(crate::Error::Config(format!(
                    "auth.url must be http or https, got '{}'",
                    url.scheme()
                )));
            }
            Err(e) => {
                return Err(crate::Error::Config(format!("auth.url is invalid: {}", e)));
            }
        }

        if self.auth.username.is_empty() {
            return Err(crate::Error::Config("auth.username cannot be empty".into()));
        }

        if self.auth.timeout_secs == 0 {
            return Err(crate::Error::Config("auth.timeout_secs must be greater than 0".into()));
        }

        if self.storage.timeout_secs == 0 {
            return Err(crate::Error::Config(
                "storage.timeout_secs must be greater than 0".into(),
            ));
        }

        if self.storage.container.contains('/') {
            return Err(crate::Error::Config(format!(
                "storage.container '{}' cannot contain '/'",
                self.storage.container
            )));
        }

        Ok(())
    }

    /// Get auth timeout as Duration
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth.timeout_secs)
    }

    /// Get storage timeout as Duration
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage.timeout_secs)
    }

    /// Get the container name
    pub fn container(&self) -> &str {
        &self.storage.container
    }
}
