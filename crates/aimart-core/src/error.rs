//! Error types for the aimart marketplace client

use thiserror::Error;

/// Main error type for the aimart client
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure: connection refused, DNS, TLS, timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the API
    #[error("API returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Http {
        /// HTTP status code
        status: u16,
        /// Human-readable `message` field from the response body, if any
        message: Option<String>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// User input rejected before dispatch
    #[error("Validation error: {field} - {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// Another action is already running for this item
    #[error("Action already in progress for {id}")]
    Busy {
        /// Item identifier
        id: String,
    },

    /// Not found error
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Resource that was not found
        resource: String,
    },

    /// Request superseded by a newer one or the page was closed
    #[error("Request cancelled")]
    Cancelled,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Message to show the user when `action` fails with this error.
    ///
    /// A server-supplied `message` wins; validation errors carry their own
    /// text; everything else falls back to `Failed to {action}`.
    #[must_use]
    pub fn user_message(&self, action: &str) -> String {
        match self {
            Self::Http {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::Validation { message, .. } => message.clone(),
            Self::Busy { .. } => format!("Please wait, still trying to {action}"),
            _ => format!("Failed to {action}"),
        }
    }

    /// Whether this error came from the transport or the server rather than
    /// from local state
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http { .. })
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::uninlined_format_args)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::error::Error as StdError;

    #[test]
    fn test_http_error_display_with_message() {
        let error = Error::Http {
            status: 422,
            message: Some("Code already exists".to_string()),
        };
        assert_eq!(format!("{}", error), "API returned 422: Code already exists");
    }

    #[test]
    fn test_http_error_display_without_message() {
        let error = Error::Http {
            status: 500,
            message: None,
        };
        assert_eq!(format!("{}", error), "API returned 500");
    }

    #[test]
    fn test_validation_error() {
        let error = Error::validation("code", "Code is required");
        assert_eq!(format!("{}", error), "Validation error: code - Code is required");
    }

    #[rstest]
    #[case(Error::Network("connection refused".into()), "Failed to delete promocode")]
    #[case(Error::Http { status: 500, message: None }, "Failed to delete promocode")]
    #[case(Error::Http { status: 500, message: Some("   ".into()) }, "Failed to delete promocode")]
    #[case(Error::Http { status: 409, message: Some("Promocode in use".into()) }, "Promocode in use")]
    #[case(Error::validation("code", "Code is required"), "Code is required")]
    #[case(Error::Cancelled, "Failed to delete promocode")]
    fn test_user_message(#[case] error: Error, #[case] expected: &str) {
        assert_eq!(error.user_message("delete promocode"), expected);
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let error = Error::from(json_error);

        assert!(matches!(error, Error::Serialization(_)));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_is_remote() {
        assert!(Error::Network("x".into()).is_remote());
        assert!(Error::Http { status: 404, message: None }.is_remote());
        assert!(!Error::Cancelled.is_remote());
        assert!(!Error::validation("a", "b").is_remote());
    }

    #[test]
    fn test_busy_error() {
        let error = Error::Busy { id: "p-1".into() };
        assert_eq!(format!("{}", error), "Action already in progress for p-1");
        assert_eq!(error.user_message("toggle status"), "Please wait, still trying to toggle status");
    }
}
