//! SwiftStorage Error Types

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Underlying cause of a storage failure: a transport error, or an I/O
/// error while preparing a request body
pub type StorageCause = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for SwiftStorage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why an authentication attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Auth server answered 403
    InvalidCredentials,
    /// Auth server answered 404
    InvalidAuthUrl,
    /// Anything else: transport failure, unexpected status, missing headers
    Unknown,
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            AuthErrorKind::InvalidCredentials => "invalid credentials",
            AuthErrorKind::InvalidAuthUrl => "invalid auth url",
            AuthErrorKind::Unknown => "unknown reason",
        };
        f.write_str(reason)
    }
}

/// SwiftStorage error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Caller errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Auth server errors
    #[error("Auth fail: {kind}")]
    Auth {
        kind: AuthErrorKind,
        #[source]
        source: Option<reqwest::Error>,
    },

    // Storage errors
    #[error("Storage error: {operation} failed")]
    Storage {
        operation: &'static str,
        #[source]
        source: StorageCause,
    },

    #[error("Object is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn auth(kind: AuthErrorKind, source: reqwest::Error) -> Self {
        Error::Auth {
            kind,
            source: Some(source),
        }
    }

    pub(crate) fn storage(operation: &'static str, source: impl Into<StorageCause>) -> Self {
        Error::Storage {
            operation,
            source: source.into(),
        }
    }

    /// The transport error behind a storage failure, if there is one
    fn storage_transport(&self) -> Option<&reqwest::Error> {
        match self {
            Error::Storage { source, .. } => source.downcast_ref::<reqwest::Error>(),
            _ => None,
        }
    }

    /// The auth failure kind, if this is an auth error
    pub fn auth_kind(&self) -> Option<AuthErrorKind> {
        match self {
            Error::Auth { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// HTTP status carried by the underlying transport error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Auth { source, .. } => source.as_ref().and_then(|e| e.status()),
            Error::Storage { .. } => self.storage_transport().and_then(|e| e.status()),
            _ => None,
        }
    }

    /// Check if the server answered 404
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Check if the server answered 401
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Check if this error is retryable by the caller.
    ///
    /// The client itself never retries these; it only recovers a single 401.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Storage { .. } => self.storage_transport().is_some_and(|source| {
                source.is_timeout()
                    || source.is_connect()
                    || source.status().is_some_and(|s| s.is_server_error())
            }),
            Error::Auth {
                kind: AuthErrorKind::Unknown,
                source: Some(source),
            } => source.is_timeout() || source.is_connect(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_kind_display() {
        assert_eq!(AuthErrorKind::InvalidCredentials.to_string(), "invalid credentials");
        assert_eq!(AuthErrorKind::InvalidAuthUrl.to_string(), "invalid auth url");
        assert_eq!(AuthErrorKind::Unknown.to_string(), "unknown reason");
    }

    #[test]
    fn test_auth_error_without_source() {
        let err = Error::Auth {
            kind: AuthErrorKind::Unknown,
            source: None,
        };
        assert_eq!(err.to_string(), "Auth fail: unknown reason");
        assert_eq!(err.auth_kind(), Some(AuthErrorKind::Unknown));
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_storage_error_from_io_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "seek failed");
        let err = Error::storage("put", cause);
        assert!(matches!(err, Error::Storage { operation: "put", .. }));
        assert_eq!(err.to_string(), "Storage error: put failed");
        assert_eq!(err.status(), None);
        assert!(!err.is_retryable());

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "seek failed");
    }

    #[test]
    fn test_non_transport_errors_have_no_status() {
        let err = Error::InvalidArgument("source path is empty".into());
        assert_eq!(err.status(), None);
        assert_eq!(err.auth_kind(), None);
        assert!(!err.is_unauthorized());
    }
}
