//! Scan error types
//!
//! Two layers: [`TransportError`] for anything that went wrong talking to the
//! service, and [`ScanError`] for everything an orchestration result can
//! resolve with. Both are `Clone` because a single failure is observed by
//! every reader of a memoized result.

/// Message used when the service cancels a scan without giving a reason
pub const DEFAULT_CANCELLED_MESSAGE: &str = "Canceled";

/// Message used when the service fails a scan without giving a reason
pub const DEFAULT_FAILED_MESSAGE: &str = "Scan failed";

/// Message used when the local operation was hung up
pub const HANGUP_MESSAGE: &str = "Scan operation was hung up";

/// Failure of a single Scan Transport call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Local I/O failure, e.g. the artifact could not be read
    #[error("I/O error: {0}")]
    Io(String),

    /// Connection or protocol level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Credentials missing, invalid or lacking permissions
    #[error("Authorization failed: {0}")]
    Unauthorized(String),

    /// Service answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Service answered with a payload that could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Transport could not be set up, e.g. a malformed base URL
    #[error("Transport configuration error: {0}")]
    Configuration(String),
}

impl TransportError {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, TransportError::Unauthorized(_))
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            TransportError::InvalidResponse(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::InvalidResponse(format!("JSON parse error: {}", err))
    }
}

/// Failure of a scan orchestration result
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// A transport call failed; never retried
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The remote scan reported `FAILED`
    #[error("Scan failed: {message}")]
    Failed { message: String },

    /// The remote scan reported `CANCELLED`, or the operation was hung up
    #[error("Scan cancelled: {message}")]
    Cancelled { message: String },

    /// A required argument was missing or malformed
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Writing results to the local filesystem failed
    #[error("Failed to write results: {0}")]
    Io(String),

    /// A background task panicked
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    pub fn failed(message: Option<&str>) -> Self {
        Self::Failed {
            message: message.unwrap_or(DEFAULT_FAILED_MESSAGE).to_string(),
        }
    }

    pub fn cancelled(message: Option<&str>) -> Self {
        Self::Cancelled {
            message: message.unwrap_or(DEFAULT_CANCELLED_MESSAGE).to_string(),
        }
    }

    pub fn hung_up() -> Self {
        Self::Cancelled {
            message: HANGUP_MESSAGE.to_string(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, ScanError::Cancelled { .. })
    }

    /// The bare message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            ScanError::Transport(err) => err.to_string(),
            ScanError::Failed { message } | ScanError::Cancelled { message } => message.clone(),
            ScanError::Precondition(message)
            | ScanError::Io(message)
            | ScanError::Internal(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::failed(Some("X"));
        assert_eq!(err.to_string(), "Scan failed: X");
        assert_eq!(err.message(), "X");

        let err = ScanError::Transport(TransportError::api(500, "boom"));
        assert_eq!(err.to_string(), "Transport error: API error 500: boom");
    }

    #[test]
    fn test_cancellation_defaults() {
        let err = ScanError::cancelled(None);
        assert!(err.is_cancellation());
        assert_eq!(err.message(), "Canceled");

        assert!(ScanError::hung_up().is_cancellation());
        assert!(!ScanError::failed(None).is_cancellation());
        assert_eq!(ScanError::failed(None).message(), "Scan failed");
    }

    #[test]
    fn test_auth_error_detection() {
        assert!(TransportError::Unauthorized("bad token".to_string()).is_auth_error());
        assert!(!TransportError::Timeout.is_auth_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.jar");
        let err: TransportError = io.into();
        assert!(matches!(err, TransportError::Io(ref msg) if msg.contains("missing.jar")));
    }
}
