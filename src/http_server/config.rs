//! Admin server configuration
//!
//! Host, port and CORS settings, paging defaults, and the table store
//! connection. Loaded from the environment by [`AdminConfig::from_env`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::DynamoBackendConfig;
use crate::observability::{Logger, Severity};
use crate::pagination::{DEFAULT_CHUNK_SIZE, DEFAULT_PAGE_SIZE};

/// Configuration errors; the process refuses to start on any of them
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("refusing to run against a remote endpoint: {0}")]
    RemoteEndpoint(String),

    #[error("refusing to run with {0}=production")]
    Production(String),
}

impl ConfigError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::RemoteEndpoint(_) => "CONFIG_REMOTE_ENDPOINT",
            ConfigError::Production(_) => "CONFIG_PRODUCTION",
        }
    }

    fn invalid(key: &str, value: &str) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Admin server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8001)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Records per page when the request does not say (default: 25)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Items requested per backend call (default: 10)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Deadline for assembling one page, in milliseconds
    #[serde(default)]
    pub page_timeout_ms: Option<u64>,

    /// Minimum log severity (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub backend: DynamoBackendConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            page_size: default_page_size(),
            chunk_size: default_chunk_size(),
            page_timeout_ms: None,
            log_level: default_log_level(),
            backend: DynamoBackendConfig::default(),
        }
    }
}

impl AdminConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Load from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any variable source.
    ///
    /// Reads `HOST`, `PORT`, `DYNAMO_ENDPOINT`, `AWS_REGION`,
    /// `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the `ADMIN_*`
    /// paging, CORS and log settings. `NODE_ENV` or `ADMIN_ENV` set to
    /// `production` is refused.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in ["NODE_ENV", "ADMIN_ENV"] {
            if lookup(key).as_deref() == Some("production") {
                return Err(ConfigError::Production(key.to_string()));
            }
        }

        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::invalid("PORT", &port))?;
        }
        if let Some(size) = lookup("ADMIN_PAGE_SIZE") {
            config.page_size = size
                .parse()
                .map_err(|_| ConfigError::invalid("ADMIN_PAGE_SIZE", &size))?;
        }
        if let Some(size) = lookup("ADMIN_CHUNK_SIZE") {
            config.chunk_size = size
                .parse()
                .map_err(|_| ConfigError::invalid("ADMIN_CHUNK_SIZE", &size))?;
        }
        if let Some(ms) = lookup("ADMIN_PAGE_TIMEOUT_MS") {
            let ms = ms
                .parse()
                .map_err(|_| ConfigError::invalid("ADMIN_PAGE_TIMEOUT_MS", &ms))?;
            config.page_timeout_ms = Some(ms);
        }
        if let Some(origins) = lookup("ADMIN_CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(level) = lookup("ADMIN_LOG_LEVEL") {
            config.log_level = level;
        }

        match lookup("DYNAMO_ENDPOINT") {
            Some(endpoint) => config.backend.endpoint = endpoint,
            None => Logger::warn(
                "DYNAMO_ENDPOINT_UNSET",
                &[("endpoint", config.backend.endpoint.as_str())],
            ),
        }
        if let Some(region) = lookup("AWS_REGION") {
            config.backend.region = region;
        }
        if let Some(key) = lookup("AWS_ACCESS_KEY_ID") {
            config.backend.access_key_id = key;
        }
        if let Some(secret) = lookup("AWS_SECRET_ACCESS_KEY") {
            config.backend.secret_access_key = secret;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that serde defaults cannot guard
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::invalid("page_size", "0"));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::invalid("chunk_size", "0"));
        }
        self.log_severity()?;
        if self.backend.endpoint.contains(".amazonaws.com") {
            return Err(ConfigError::RemoteEndpoint(self.backend.endpoint.clone()));
        }
        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> Result<Severity, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::invalid("log_level", &self.log_level))
    }
}
