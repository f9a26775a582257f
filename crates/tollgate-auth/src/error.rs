//! Authentication and token lifecycle error types.
//!
//! This module defines all error types that can occur while verifying
//! credentials, issuing tokens, and talking to the token record store.

use std::fmt;

/// Errors that can occur during credential verification and token operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The username/password pair was rejected.
    ///
    /// Deliberately carries no detail: callers must not learn whether the
    /// username or the password was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The client credentials are invalid or the client is not registered.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client is invalid.
        message: String,
    },

    /// The refresh handle is unknown, expired, or bound to another client.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// A presented token is malformed, badly signed, or its claims are unusable.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The request or record is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// A requested credential or record does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },

    /// A uniqueness constraint was violated.
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// The backing store is unreachable or an operation timed out.
    ///
    /// Safe to retry by the caller; never retried inside this crate.
    #[error("Temporarily unavailable: {message}")]
    Transient {
        /// Description of the transient failure.
        message: String,
    },

    /// A non-retryable storage failure.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The configuration is invalid. Raised at construction time only.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `Transient` error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::InvalidClient { .. }
                | Self::InvalidGrant { .. }
                | Self::InvalidToken { .. }
                | Self::InvalidRequest { .. }
                | Self::NotFound { .. }
                | Self::Conflict { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Transient { .. }
                | Self::Storage { .. }
                | Self::Configuration { .. }
                | Self::Internal { .. }
        )
    }

    /// Returns `true` if the caller may retry the operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns `true` if this error should abort startup.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns `true` if this is an authentication error.
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::InvalidClient { .. } | Self::InvalidGrant { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCredentials => ErrorCategory::Authentication,
            Self::InvalidClient { .. } => ErrorCategory::Authentication,
            Self::InvalidGrant { .. } => ErrorCategory::Authentication,
            Self::InvalidToken { .. } => ErrorCategory::Token,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::Lookup,
            Self::Conflict { .. } => ErrorCategory::Validation,
            Self::Transient { .. } => ErrorCategory::Infrastructure,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_grant",
            Self::InvalidClient { .. } => "invalid_client",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::InvalidToken { .. } => "invalid_token",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::NotFound { .. } => "invalid_request",
            Self::Conflict { .. } => "invalid_request",
            Self::Transient { .. } => "temporarily_unavailable",
            Self::Storage { .. } => "server_error",
            Self::Configuration { .. } => "server_error",
            Self::Internal { .. } => "server_error",
        }
    }
}

/// Categories of errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Credential and grant verification failures.
    Authentication,
    /// Token validation failures.
    Token,
    /// Request validation errors.
    Validation,
    /// Absent credentials or records.
    Lookup,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Lookup => write!(f, "lookup"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_client("client not found");
        assert_eq!(err.to_string(), "Invalid client: client not found");

        let err = AuthError::InvalidCredentials;
        assert_eq!(err.to_string(), "Invalid credentials");

        let err = AuthError::transient("create token record timed out");
        assert_eq!(
            err.to_string(),
            "Temporarily unavailable: create token record timed out"
        );
    }

    #[test]
    fn test_error_predicates() {
        let err = AuthError::invalid_client("test");
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert!(err.is_authentication_error());

        let err = AuthError::transient("pool timed out");
        assert!(err.is_server_error());
        assert!(err.is_retryable());
        assert!(!err.is_fatal());

        let err = AuthError::storage("row decode failed");
        assert!(err.is_server_error());
        assert!(!err.is_retryable());

        let err = AuthError::configuration("missing signing secret");
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::InvalidCredentials.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AuthError::invalid_token("bad signature").category(),
            ErrorCategory::Token
        );
        assert_eq!(
            AuthError::not_found("client c1").category(),
            ErrorCategory::Lookup
        );
        assert_eq!(
            AuthError::transient("test").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            AuthError::configuration("test").category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_oauth_error_code() {
        assert_eq!(
            AuthError::InvalidCredentials.oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(
            AuthError::invalid_client("test").oauth_error_code(),
            "invalid_client"
        );
        assert_eq!(
            AuthError::transient("test").oauth_error_code(),
            "temporarily_unavailable"
        );
        assert_eq!(
            AuthError::internal("test").oauth_error_code(),
            "server_error"
        );
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Authentication.to_string(), "authentication");
        assert_eq!(ErrorCategory::Lookup.to_string(), "lookup");
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}
