//! Configuration management

pub mod validation;

pub use validation::{Validate, ValidationError};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the API token, checked after the config sources
pub const API_TOKEN_ENV: &str = "VULNERA_SCAN_API_TOKEN";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScanConfig {
    pub service: ServiceConfig,
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
}

/// Remote analysis service configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the analysis service, e.g. `https://api.vulnera.studio`
    pub base_url: String,
    /// Bearer token used for every request
    pub api_token: Option<String>,
    pub organization_id: String,
    pub project_id: String,
    /// Timeout for a single HTTP request (in seconds)
    pub request_timeout_seconds: u64,
    /// Optional HTTP(S) proxy for all requests
    pub proxy_url: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.vulnera.studio".to_string(),
            api_token: None,
            organization_id: String::new(),
            project_id: String::new(),
            request_timeout_seconds: 30,
            proxy_url: None,
        }
    }
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

// Keep the token out of logs and debug output
impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("organization_id", &self.organization_id)
            .field("project_id", &self.project_id)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("proxy_url", &self.proxy_url)
            .finish()
    }
}

/// Scan status polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between two status polls (in seconds)
    pub interval_seconds: u64,
    /// Upper bound for waiting on a scan (in seconds); unbounded when unset
    pub timeout_seconds: Option<u64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 15,
            timeout_seconds: None,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_with(None)
    }

    /// Load configuration, layering `path` above the default config files
    pub fn load_from(path: &Path) -> Result<Self, ConfigLoadError> {
        Self::load_with(Some(path))
    }

    fn load_with(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Add environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder = builder.add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // Environment variables last (highest priority)
        builder = builder.add_source(config::Environment::with_prefix("VULNERA_SCAN").separator("__"));

        let mut config: ScanConfig = builder.build()?.try_deserialize()?;

        // Dedicated token variable, so CI secrets do not need the nested name
        if config.service.api_token.is_none()
            && let Ok(token) = std::env::var(API_TOKEN_ENV)
            && !token.trim().is_empty()
        {
            config.service.api_token = Some(token);
        }

        config.validate()?;

        Ok(config)
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}
