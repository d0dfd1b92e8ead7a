//! Error types for the Resolv application.

use thiserror::Error;

/// A shared error type for the dialogue orchestrator.
///
/// Only `Initialization`, `Service` and `ProtocolExhausted` are expected to
/// reach the turn controller. The remaining variants come from configuration
/// loading and are folded into `Initialization` when a session is created.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolvError {
    /// Missing credentials or unreachable service at session creation
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Failure during a request/response round with the model service
    #[error("Service error: {message}")]
    Service {
        message: String,
        status_code: Option<u16>,
        is_retryable: bool,
    },

    /// The tool-calling loop hit its round cap without a final answer
    #[error("Protocol exhausted after {rounds} rounds without a final answer")]
    ProtocolExhausted { rounds: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },
}

impl ResolvError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an Initialization error
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization(message.into())
    }

    /// Creates a non-retryable Service error without an HTTP status
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
            status_code: None,
            is_retryable: false,
        }
    }

    /// Creates a Service error for a request that exceeded its deadline
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::Service {
            message: format!("request timed out after {}s", after.as_secs()),
            status_code: None,
            is_retryable: true,
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an Initialization error
    pub fn is_initialization(&self) -> bool {
        matches!(self, Self::Initialization(_))
    }

    /// Check if this is a Service error
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service { .. })
    }

    /// Check if this is a ProtocolExhausted error
    pub fn is_protocol_exhausted(&self) -> bool {
        matches!(self, Self::ProtocolExhausted { .. })
    }

    /// Folds configuration-loading failures into an Initialization error.
    ///
    /// Errors that are already part of the dialogue taxonomy pass through.
    pub fn into_initialization(self) -> Self {
        match self {
            Self::Config(_) | Self::Serialization { .. } | Self::Io { .. } => {
                Self::Initialization(self.to_string())
            }
            other => other,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ResolvError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ResolvError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ResolvError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ResolvError>`.
pub type Result<T> = std::result::Result<T, ResolvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_fold_into_initialization() {
        let err = ResolvError::config("no api key").into_initialization();
        assert!(err.is_initialization());
        assert!(err.to_string().contains("no api key"));
    }

    #[test]
    fn test_service_errors_pass_through_fold() {
        let err = ResolvError::service("boom").into_initialization();
        assert!(err.is_service());
    }

    #[test]
    fn test_timeout_is_retryable_service_error() {
        let err = ResolvError::timeout(std::time::Duration::from_secs(30));
        match err {
            ResolvError::Service {
                is_retryable,
                status_code,
                ref message,
            } => {
                assert!(is_retryable);
                assert_eq!(status_code, None);
                assert!(message.contains("30s"));
            }
            _ => panic!("expected Service error"),
        }
    }
}
