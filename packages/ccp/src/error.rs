//! Error types for the CCP client.
//!
//! Every failure carries an [`ErrorKind`] so callers can branch on the
//! category without matching on message text. Validation errors are raised
//! before any network I/O; everything else comes from the transport or from
//! a classified vendor response.

use std::path::PathBuf;

use thiserror::Error;

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Request parameters rejected locally or by the CCP.
    Validation,
    /// Could not reach the CCP, or the CCP could not reach the Vault.
    ConnectionFailure,
    /// The application failed the CCP authentication check.
    AuthenticationFailure,
    /// The application is authenticated but not allowed to read the account.
    AuthorizationFailure,
    /// No matching account, or too many matching accounts.
    NotFound,
    /// The password is being changed by the CPM.
    Conflict,
    /// The transport gave up after the configured timeout.
    Timeout,
    /// Response body could not be parsed.
    InvalidResponse,
    /// Client could not be constructed from its configuration.
    Configuration,
    /// Unmapped server or request failure.
    Client,
}

impl ErrorKind {
    /// Get the kind name for display and logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::ConnectionFailure => "connection_failure",
            Self::AuthenticationFailure => "authentication_failure",
            Self::AuthorizationFailure => "authorization_failure",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Timeout => "timeout",
            Self::InvalidResponse => "invalid_response",
            Self::Configuration => "configuration",
            Self::Client => "client",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pre-flight parameter validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("AppID required")]
    MissingAppId,

    #[error("insufficient search criteria: the query must contain the AppID and at least one other parameter")]
    InsufficientCriteria,

    #[error("invalid character '{character}' in parameter '{field}': characters '+', '&', '%', ';' and spaces are not supported")]
    InvalidCharacter { field: &'static str, character: char },

    #[error("invalid query format '{0}': expected Exact or Regexp")]
    InvalidQueryFormat(String),

    #[error("connection timeout must be a positive integer, got '{0}'")]
    InvalidConnectionTimeout(String),

    #[error("parameter '{field}' must be true or false, got '{value}'")]
    InvalidFlag { field: &'static str, value: String },
}

/// Failure raised by the transport before a response was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("Connection error: {0}")]
    Connect(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Request failed: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Connect(_) => ErrorKind::ConnectionFailure,
            Self::Request(_) => ErrorKind::Client,
        }
    }
}

/// A classified failure response from the CCP.
///
/// Keeps the HTTP status and the raw vendor code so that unmapped codes can
/// still be diagnosed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServerFailure {
    pub kind: ErrorKind,
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

/// Main error type for the CCP client library.
#[derive(Debug, Error)]
pub enum CcpError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Server(#[from] ServerFailure),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Certificate or CA bundle could not be read or parsed.
    #[error("failed to load certificate {}: {source}", .path.display())]
    Certificate {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Building the underlying HTTP client failed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl CcpError {
    /// Category of this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Transport(e) => e.kind(),
            Self::Server(f) => f.kind,
            Self::Config(_) | Self::Certificate { .. } | Self::HttpClient(_) => {
                ErrorKind::Configuration
            }
        }
    }

    /// Vendor error code, when the failure came from the CCP.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Server(f) => f.code.as_deref(),
            _ => None,
        }
    }
}

/// Result type alias for CCP client operations.
pub type Result<T> = std::result::Result<T, CcpError>;
