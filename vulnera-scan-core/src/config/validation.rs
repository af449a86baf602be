//! Configuration validation module

use crate::config::{LoggingConfig, PollingConfig, ScanConfig, ServiceConfig};

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Service configuration error: {message}")]
    Service { message: String },

    #[error("Polling configuration error: {message}")]
    Polling { message: String },

    #[error("Logging configuration error: {message}")]
    Logging { message: String },
}

impl ValidationError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    pub fn polling(message: impl Into<String>) -> Self {
        Self::Polling {
            message: message.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let base_url = url::Url::parse(&self.base_url)
            .map_err(|e| ValidationError::service(format!("Invalid base_url: {}", e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ValidationError::service(
                "base_url must use the http or https scheme",
            ));
        }

        if self.request_timeout_seconds == 0 {
            return Err(ValidationError::service(
                "request_timeout_seconds must be > 0",
            ));
        }

        if let Some(proxy) = &self.proxy_url {
            url::Url::parse(proxy)
                .map_err(|e| ValidationError::service(format!("Invalid proxy_url: {}", e)))?;
        }

        if let Some(token) = &self.api_token
            && token.trim().is_empty()
        {
            return Err(ValidationError::service("api_token must not be blank"));
        }

        Ok(())
    }
}

impl Validate for PollingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // A zero interval is allowed and polls as fast as the runtime permits
        if self.timeout_seconds == Some(0) {
            return Err(ValidationError::polling(
                "timeout_seconds must be > 0 when set",
            ));
        }
        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.format.as_str(), "pretty" | "json") {
            return Err(ValidationError::logging(format!(
                "Unknown log format '{}', expected 'pretty' or 'json'",
                self.format
            )));
        }
        if self.level.trim().is_empty() {
            return Err(ValidationError::logging("level must not be empty"));
        }
        Ok(())
    }
}

impl Validate for ScanConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.service.validate()?;
        self.polling.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
